use serde::{Deserialize, Serialize};

/// Fiat currencies an exchange may report as a balance.
pub const FIAT_CURRENCIES: &[&str] = &[
    "BRL", "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "CNY", "ARS", "MXN",
];

/// Stablecoins pegged to a fiat currency.
pub const STABLECOINS: &[&str] = &[
    "USDT", "USDC", "BUSD", "DAI", "TUSD", "USDP", "USDD", "GUSD", "PYUSD", "FDUSD",
];

/// Category of a held asset.
/// Fiat and stablecoins have no meaningful market movement, so views label them
/// instead of highlighting their change badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Government currency (BRL, USD, EUR, ...)
    Fiat,
    /// Token pegged to a fiat currency (USDT, USDC, ...)
    Stablecoin,
    /// Anything else
    Crypto,
}

impl AssetKind {
    /// Classify a symbol, case-insensitively.
    pub fn classify(symbol: &str) -> Self {
        let upper = symbol.to_uppercase();
        if FIAT_CURRENCIES.contains(&upper.as_str()) {
            AssetKind::Fiat
        } else if STABLECOINS.contains(&upper.as_str()) {
            AssetKind::Stablecoin
        } else {
            AssetKind::Crypto
        }
    }

    /// Fiat or stablecoin.
    pub fn is_pegged(self) -> bool {
        matches!(self, AssetKind::Fiat | AssetKind::Stablecoin)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Fiat => write!(f, "Fiat"),
            AssetKind::Stablecoin => write!(f, "Stablecoin"),
            AssetKind::Crypto => write!(f, "Crypto"),
        }
    }
}
