use crate::duration;
use crate::error::{Result, TrackerError};
use crate::models::Shift;
use std::fs;
use std::path::Path;

pub fn execute(file: &Path, write: bool, json: bool) -> Result<()> {
    let mut shift = load(file)?;
    shift.recompute();

    if write {
        fs::write(file, serde_json::to_string_pretty(&shift)?)?;
        tracing::info!("Updated activity times in {}", file.display());
    }

    if json {
        let activities: Vec<_> = shift
            .actividades
            .iter()
            .map(|a| {
                let time = a.time();
                let timestamps = a.timestamps(shift.fecha);
                serde_json::json!({
                    "id": a.id,
                    "oti": a.oti,
                    "tiempo": a.tiempo,
                    "cruzaMedianoche": time.crosses_midnight,
                    "inicio": timestamps.map(|(start, _)| start),
                    "fin": timestamps.map(|(_, end)| end),
                })
            })
            .collect();

        let summary = serde_json::json!({
            "fecha": shift.fecha,
            "operario": shift.operario,
            "actividades": activities,
            "totalTiempo": shift.total_minutes(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Jornada {}", shift.fecha);
    if let Some(operario) = &shift.operario {
        println!("Operario: {}", operario);
    }
    println!();

    if shift.actividades.is_empty() {
        println!("  No activities recorded.");
    }

    for activity in &shift.actividades {
        let time = activity.time();
        println!(
            "  {:<12} {:<16} {:>5} - {:<5} {:>8}{}",
            activity.oti,
            activity.proceso,
            activity.hora_inicio.as_deref().unwrap_or("--:--"),
            activity.hora_fin.as_deref().unwrap_or("--:--"),
            duration::format_minutes(activity.tiempo),
            if time.crosses_midnight { "  (+1 day)" } else { "" }
        );
    }

    println!();
    println!(
        "Total: {} ({} min)",
        duration::format_minutes(shift.total_minutes()),
        shift.total_minutes()
    );

    Ok(())
}

fn load(file: &Path) -> Result<Shift> {
    let contents = fs::read_to_string(file).map_err(|e| {
        TrackerError::StorageError(format!("Failed to read {}: {}", file.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}
