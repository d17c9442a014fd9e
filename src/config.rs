use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::{
    application::handlers::wish_dispatcher::{DispatchConfig, TemplateCatalog},
    infrastructure::whatsapp::client::WhatsAppConfig,
};

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    /// Absent selects the in-memory repository.
    pub database_url: Option<String>,
    pub dispatch_key: Option<String>,
    pub dispatch_interval: Option<Duration>,
    pub verify_token: Option<String>,
    pub whatsapp: WhatsAppConfig,
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn try_parse() -> Result<Config, String> {
        let _ = dotenv();
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let templates = TemplateCatalog::default();
        let dispatch_defaults = DispatchConfig::default();
        let whatsapp_defaults = WhatsAppConfig::default();

        let locales: Vec<String> = env
            .optional("TEMPLATE_LOCALES")
            .map(|raw| {
                raw.split(',')
                    .map(|locale| locale.trim().to_string())
                    .filter(|locale| !locale.is_empty())
                    .collect()
            })
            .filter(|locales: &Vec<String>| !locales.is_empty())
            .unwrap_or(dispatch_defaults.locales);

        Ok(Config {
            port: env.parsed_required("PORT")?,
            scheme: env.required("SCHEME")?,
            host: env.required("HOST")?,
            database_url: env.optional("DATABASE_URL"),
            dispatch_key: env.optional("DISPATCH_KEY"),
            dispatch_interval: env
                .parsed::<u64>("DISPATCH_INTERVAL_SECONDS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            verify_token: env.optional("WHATSAPP_VERIFY_TOKEN"),
            whatsapp: WhatsAppConfig {
                api_base: env
                    .optional("WHATSAPP_API_BASE")
                    .unwrap_or(whatsapp_defaults.api_base),
                api_version: env
                    .optional("WHATSAPP_API_VERSION")
                    .unwrap_or(whatsapp_defaults.api_version),
                access_token: env.optional("WHATSAPP_ACCESS_TOKEN"),
                phone_number_id: env.optional("WHATSAPP_PHONE_NUMBER_ID"),
                request_timeout: env
                    .parsed::<u64>("HTTP_TIMEOUT_SECONDS")?
                    .map(Duration::from_secs)
                    .unwrap_or(whatsapp_defaults.request_timeout),
            },
            dispatch: DispatchConfig {
                templates: TemplateCatalog {
                    text: env.optional("TEMPLATE_TEXT").unwrap_or(templates.text),
                    image: env.optional("TEMPLATE_IMAGE").unwrap_or(templates.image),
                    video: env.optional("TEMPLATE_VIDEO").unwrap_or(templates.video),
                    document: env
                        .optional("TEMPLATE_DOCUMENT")
                        .unwrap_or(templates.document),
                    video_follow_up: env
                        .optional("TEMPLATE_VIDEO_FOLLOW_UP")
                        .unwrap_or(templates.video_follow_up),
                    document_follow_up: env
                        .optional("TEMPLATE_DOCUMENT_FOLLOW_UP")
                        .unwrap_or(templates.document_follow_up),
                    marketing: env
                        .optional("TEMPLATE_MARKETING")
                        .unwrap_or(templates.marketing),
                },
                locales,
                message_delay: env
                    .parsed::<u64>("MESSAGE_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(dispatch_defaults.message_delay),
                wish_delay: env
                    .parsed::<u64>("WISH_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(dispatch_defaults.wish_delay),
                batch_limit: env
                    .parsed::<u32>("DISPATCH_BATCH_LIMIT")?
                    .filter(|limit| *limit > 0)
                    .unwrap_or(dispatch_defaults.batch_limit),
                stale_claim_timeout: env
                    .parsed::<u64>("STALE_CLAIM_SECONDS")?
                    .map(Duration::from_secs)
                    .unwrap_or(dispatch_defaults.stale_claim_timeout),
                brand_name: env
                    .optional("BRAND_NAME")
                    .unwrap_or(dispatch_defaults.brand_name),
                marketing_image_url: env.optional("MARKETING_IMAGE_URL"),
            },
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, String> {
        self.optional(key)
            .ok_or_else(|| format!("An error occurred while getting {key} env param"))
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, String> {
        self.optional(key)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|_| format!("An error occurred while parsing {key} env param"))
            })
            .transpose()
    }

    fn parsed_required<T: FromStr>(&self, key: &str) -> Result<T, String> {
        self.parsed(key)?
            .ok_or_else(|| format!("An error occurred while getting {key} env param"))
    }
}
