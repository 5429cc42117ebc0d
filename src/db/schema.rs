//! Warehouse schema definitions

pub const CREATE_COUNTRY_CODE: &str = r#"
CREATE TABLE IF NOT EXISTS COUNTRY_CODE (
    COUNTRY_NAME TEXT PRIMARY KEY,
    COUNTRY_CODE TEXT NOT NULL,  -- dial prefix
    RISK_SCORE INTEGER NOT NULL
)
"#;

// One row per call or SMS, already enriched with the destination country
pub const CREATE_CDRS_ENRICHED: &str = r#"
CREATE TABLE IF NOT EXISTS CDRS_ENRICHED (
    CDR_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    CALL_START TEXT NOT NULL,
    ANUM TEXT NOT NULL,
    BNUM TEXT NOT NULL,
    B_COUNTRY_CODE TEXT,
    COUNTRY_NAME TEXT NOT NULL,
    COUNTRY_RISK_SCORE INTEGER NOT NULL,
    CDR_DIRECTION TEXT NOT NULL,  -- 'Outgoing' | 'Incoming'
    CDR_TYPE TEXT NOT NULL,       -- 'Voice' | 'SMS'
    RATE REAL NOT NULL DEFAULT 0,
    DURATION INTEGER NOT NULL DEFAULT 0  -- milliseconds
)
"#;

// Voice dashboards filter on direction + type + risk
pub const CREATE_INDEX_VOICE: &str =
    "CREATE INDEX IF NOT EXISTS idx_cdrs_voice ON CDRS_ENRICHED(CDR_TYPE, CDR_DIRECTION, COUNTRY_RISK_SCORE)";

// SMS dashboards group by called number
pub const CREATE_INDEX_BNUM: &str =
    "CREATE INDEX IF NOT EXISTS idx_cdrs_bnum ON CDRS_ENRICHED(CDR_TYPE, BNUM)";
