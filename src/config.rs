use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    pub postgres_url: String,
    pub jwt_secret: String,
    pub admin: AdminSeedConfig,
    #[serde(default)]
    pub rules: LedgerRules,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Bootstrap operator account, created at startup if missing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminSeedConfig {
    pub username: String,
    pub password: String,
    pub security_password: String,
}

/// Business rules for the account ledger. All monetary values are decimal
/// strings in the YAML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerRules {
    pub min_deposit: Decimal,
    pub min_withdrawal: Decimal,
    pub min_investment: Decimal,
    pub referral_commission_rate: Decimal,
    pub first_deposit_bonus_rate: Decimal,
    pub investment_cooldown_hours: i64,
}

impl Default for LedgerRules {
    fn default() -> Self {
        Self {
            min_deposit: Decimal::new(50, 0),
            min_withdrawal: Decimal::new(3, 0),
            min_investment: Decimal::new(50, 0),
            referral_commission_rate: Decimal::new(12, 2),
            first_deposit_bonus_rate: Decimal::new(10, 2),
            investment_cooldown_hours: 24,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = LedgerRules::default();
        assert_eq!(rules.min_deposit, Decimal::new(50, 0));
        assert_eq!(rules.min_withdrawal, Decimal::new(3, 0));
        assert_eq!(rules.referral_commission_rate, Decimal::new(12, 2));
        assert_eq!(rules.first_deposit_bonus_rate, Decimal::new(10, 2));
        assert_eq!(rules.investment_cooldown_hours, 24);
    }

    #[test]
    fn test_rules_parse_from_yaml_strings() {
        let yaml = r#"
min_deposit: "50"
min_withdrawal: "3"
min_investment: "50"
referral_commission_rate: "0.12"
first_deposit_bonus_rate: "0.10"
investment_cooldown_hours: 24
"#;
        let rules: LedgerRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.referral_commission_rate, Decimal::new(12, 2));
        assert_eq!(rules.first_deposit_bonus_rate, Decimal::new(10, 2));
    }
}
