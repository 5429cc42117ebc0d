//! Query catalog
//!
//! Five fixed, parameterless read queries. Output aliases are upper case and
//! consumed by name by the renderers.

use serde::Serialize;

/// Identifies one catalog query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryId {
    Top5Country,
    RiskCountry,
    TopCalledNumbers,
    SmsByCountry,
    SmsSpamming,
}

impl QueryId {
    /// Execution order of a full render
    pub const ALL: [QueryId; 5] = [
        QueryId::Top5Country,
        QueryId::RiskCountry,
        QueryId::TopCalledNumbers,
        QueryId::SmsByCountry,
        QueryId::SmsSpamming,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QueryId::Top5Country => "top5_country",
            QueryId::RiskCountry => "risk_country",
            QueryId::TopCalledNumbers => "top_called_numbers",
            QueryId::SmsByCountry => "sms_by_country",
            QueryId::SmsSpamming => "sms_spamming",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            QueryId::Top5Country => TOP5_COUNTRY,
            QueryId::RiskCountry => RISK_COUNTRY,
            QueryId::TopCalledNumbers => TOP_CALLED_NUMBERS,
            QueryId::SmsByCountry => SMS_BY_COUNTRY,
            QueryId::SmsSpamming => SMS_SPAMMING,
        }
    }
}

/// Countries with an elevated risk score (>= 4)
pub const RISK_COUNTRY: &str = r#"
SELECT COUNTRY_NAME AS COUNTRYNAME,
       CASE WHEN RISK_SCORE < 5 THEN 'Medium' ELSE 'High' END AS RISKSCORE
FROM COUNTRY_CODE
WHERE RISK_SCORE >= 4
ORDER BY COUNTRY_NAME
"#;

/// Outgoing billed voice traffic towards risky countries, per country
pub const TOP5_COUNTRY: &str = r#"
SELECT COUNTRY_NAME AS COUNTRYNAME,
       COUNT(*) AS TOTALCOUNT,
       SUM(RATE) AS TOTALRATE,
       SUM(DURATION) / 1000.0 AS TOTALDURATION
FROM CDRS_ENRICHED
WHERE COUNTRY_RISK_SCORE >= 4 AND RATE > 0 AND CDR_DIRECTION = 'Outgoing'
  AND CDR_TYPE = 'Voice'
GROUP BY COUNTRY_NAME
ORDER BY COUNTRY_NAME
"#;

/// Most called numbers in risky countries
pub const TOP_CALLED_NUMBERS: &str = r#"
SELECT BNUM AS BNUMBER,
       B_COUNTRY_CODE AS COUNTRYCODE,
       COUNTRY_NAME AS COUNTRYNAME,
       COUNT(*) AS TOTALCOUNT,
       SUM(RATE) AS TOTALRATE,
       SUM(DURATION) AS TOTALDURATION
FROM CDRS_ENRICHED
WHERE COUNTRY_RISK_SCORE >= 4 AND CDR_DIRECTION = 'Outgoing'
  AND CDR_TYPE = 'Voice'
GROUP BY BNUM, B_COUNTRY_CODE, COUNTRY_NAME
ORDER BY COUNT(*) DESC, BNUM
LIMIT 100
"#;

/// SMS volume from low-risk countries, per country
pub const SMS_BY_COUNTRY: &str = r#"
SELECT COUNTRY_NAME AS COUNTRYNAME,
       COUNT(*) AS TOTALCOUNT
FROM CDRS_ENRICHED
WHERE CDR_TYPE = 'SMS' AND COUNTRY_RISK_SCORE <= 3
GROUP BY COUNTRY_NAME
ORDER BY COUNT(*) DESC, COUNTRY_NAME
"#;

/// Numbers sending at least 100 SMS from low-risk countries
pub const SMS_SPAMMING: &str = r#"
SELECT BNUM AS BNUMBER,
       B_COUNTRY_CODE AS COUNTRYCODE,
       COUNTRY_NAME AS COUNTRYNAME,
       COUNT(*) AS TOTALCOUNT
FROM CDRS_ENRICHED
WHERE CDR_TYPE = 'SMS' AND COUNTRY_RISK_SCORE <= 3
GROUP BY BNUM, B_COUNTRY_CODE, COUNTRY_NAME
HAVING COUNT(*) >= 100
ORDER BY COUNT(*) DESC, BNUM
"#;
