// src/common/time.rs

use chrono::{DateTime, Duration, FixedOffset, Utc};

// Fuso do negócio: America/Sao_Paulo (sem horário de verão desde 2019,
// então um offset fixo de -03:00 é suficiente).
const SAO_PAULO_OFFSET_SECS: i32 = -3 * 3600;

fn business_offset() -> FixedOffset {
    FixedOffset::east_opt(SAO_PAULO_OFFSET_SECS).unwrap()
}

pub fn now_business() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&business_offset())
}

/// Timestamp "YYYY-MM-DD HH:MM:SS" no fuso do negócio, gravado nas vendas.
pub fn now_business_timestamp() -> String {
    now_business().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Timestamp ISO-8601 (UTC), usado em created_at/updated_at de catálogo.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Início do dia corrente no fuso do negócio ("YYYY-MM-DD 00:00:00").
pub fn today_start() -> String {
    now_business().format("%Y-%m-%d 00:00:00").to_string()
}

/// Instante de 7 dias atrás no fuso do negócio.
pub fn week_ago() -> String {
    (now_business() - Duration::days(7))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Data corrente no fuso do negócio ("YYYY-MM-DD").
pub fn today_date() -> String {
    now_business().format("%Y-%m-%d").to_string()
}

/// Data de 7 dias atrás no fuso do negócio ("YYYY-MM-DD").
pub fn week_ago_date() -> String {
    (now_business() - Duration::days(7))
        .format("%Y-%m-%d")
        .to_string()
}
