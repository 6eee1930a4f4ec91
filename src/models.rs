use crate::duration::{self, ActivityTime};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One activity ("actividad") logged inside a shift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Client-side draft id, assigned before the backend sees the record
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub oti: String,
    #[serde(default)]
    pub proceso: String,
    #[serde(default)]
    pub maquina: String,
    #[serde(default)]
    pub insumos: Vec<String>,
    #[serde(default)]
    pub tipo_tiempo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hora_inicio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hora_fin: Option<String>,
    /// Derived minutes, recomputed whenever a time field changes
    #[serde(default)]
    pub tiempo: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl Activity {
    pub fn draft() -> Self {
        Self {
            id: Uuid::new_v4(),
            oti: String::new(),
            proceso: String::new(),
            maquina: String::new(),
            insumos: Vec::new(),
            tipo_tiempo: String::new(),
            hora_inicio: None,
            hora_fin: None,
            tiempo: 0,
            observaciones: None,
        }
    }

    pub fn set_hora_inicio(&mut self, value: impl Into<String>) -> ActivityTime {
        self.hora_inicio = Some(value.into());
        self.recompute()
    }

    pub fn set_hora_fin(&mut self, value: impl Into<String>) -> ActivityTime {
        self.hora_fin = Some(value.into());
        self.recompute()
    }

    pub fn time(&self) -> ActivityTime {
        duration::elapsed(
            self.hora_inicio.as_deref().unwrap_or(""),
            self.hora_fin.as_deref().unwrap_or(""),
        )
    }

    /// Re-derive `tiempo` from the current clock times
    pub fn recompute(&mut self) -> ActivityTime {
        let time = self.time();
        self.tiempo = time.minutes;
        time
    }

    /// Full start/end timestamps on `fecha`, `None` while either time is unset
    pub fn timestamps(&self, fecha: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = duration::parse_clock(self.hora_inicio.as_deref()?)?;
        let end = duration::parse_clock(self.hora_fin.as_deref()?)?;
        Some(duration::on_reference_day(fecha, start, end))
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::draft()
    }
}

/// A work shift ("jornada")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub fecha: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operario: Option<String>,
    #[serde(default)]
    pub actividades: Vec<Activity>,
}

impl Shift {
    pub fn new(fecha: NaiveDate) -> Self {
        Self {
            fecha,
            operario: None,
            actividades: Vec::new(),
        }
    }

    /// Recompute every activity's derived time
    pub fn recompute(&mut self) {
        for activity in &mut self.actividades {
            activity.recompute();
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.actividades.iter().map(|a| a.tiempo).sum()
    }
}

/// Access/refresh token pair as returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    #[serde(rename = "refreshToken", alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "production")]
    Produccion,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Produccion => "produccion",
        }
    }
}

/// Logged-in account, stored under the `user` key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub nombre: String,
    pub email: String,
    pub rol: Role,
}

/// Validated production operator, stored under the `operario` key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operario {
    #[serde(alias = "_id")]
    pub id: String,
    pub nombre: String,
    pub cedula: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CedulaResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub operario: Operario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Expiring,
    Expired,
    NoSession,
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Expiring => "EXPIRING",
            SessionStatus::Expired => "EXPIRED",
            SessionStatus::NoSession => "NO_SESSION",
        }
    }
}
