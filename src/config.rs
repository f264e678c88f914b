use std::env;
use std::path::PathBuf;

/// Process configuration, assembled once at startup and injected into the
/// app state. The store and image pipeline only see the values they are
/// constructed with; nothing outside `from_env` reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    /// No configured PIN means unrestricted access.
    pub pin: Option<String>,
    pub currency: String,
    pub title: String,
    pub max_image_dimension: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8087);

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let public_dir =
            PathBuf::from(env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()));

        // An empty PIN variable counts as unset.
        let pin = env::var("PIN").ok().filter(|p| !p.trim().is_empty());

        let currency = env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string());
        let title = env::var("TITLE").unwrap_or_else(|_| "Wishlist".to_string());

        let max_image_dimension = env::var("MAX_IMAGE_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(crate::images::DEFAULT_MAX_DIMENSION);

        Self {
            port,
            data_dir,
            public_dir,
            pin,
            currency,
            title,
            max_image_dimension,
        }
    }

    /// Path of the persisted item document.
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join("items.json")
    }

    /// Directory the image pipeline writes into.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn currency_symbol(&self) -> &str {
        currency_symbol(&self.currency)
    }
}

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "\u{20ac}"),
    ("GBP", "\u{a3}"),
    ("JPY", "\u{a5}"),
    ("CNY", "\u{a5}"),
    ("KRW", "\u{20a9}"),
    ("INR", "\u{20b9}"),
    ("RUB", "\u{20bd}"),
    ("TRY", "\u{20ba}"),
    ("BRL", "R$"),
    ("CAD", "$"),
    ("AUD", "$"),
    ("NZD", "$"),
    ("MXN", "$"),
    ("CHF", "CHF"),
    ("SEK", "kr"),
    ("NOK", "kr"),
    ("DKK", "kr"),
    ("PLN", "z\u{142}"),
    ("CZK", "K\u{10d}"),
    ("ZAR", "R"),
];

/// Display symbol for an ISO 4217 code. Unknown codes fall back to the
/// code itself so prices still render.
pub fn currency_symbol(code: &str) -> &str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
        .unwrap_or(code)
}
