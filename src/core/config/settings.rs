use super::parsing::{
    env_optional, env_or_default, normalize_path, parse_bool, parse_cors_origins,
    parse_environment, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, GradingSettings,
    RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, TelemetrySettings,
};

/// Grades are stored as raw percentages; more than four decimals would only
/// surface floating point noise in the report card.
const MAX_SCORE_DECIMALS: u32 = 4;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("SEKOLAH_HOST", "0.0.0.0");
        let port = env_or_default("SEKOLAH_PORT", "8000");

        let environment = parse_environment(
            env_optional("SEKOLAH_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config =
            env_optional("SEKOLAH_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Sekolah API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");
        let login_path = normalize_path(env_or_default("LOGIN_PATH", "/login"));

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };

        let session_expire_minutes = parse_u64(
            "SESSION_EXPIRE_MINUTES",
            env_or_default("SESSION_EXPIRE_MINUTES", "720"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let cookie_name = env_or_default("SESSION_COOKIE_NAME", "session");
        let cookie_secure = env_optional("SESSION_COOKIE_SECURE")
            .map(|value| parse_bool(&value))
            .unwrap_or(environment.is_production());

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "sekolah");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "sekolah_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let first_admin_uid = env_or_default("FIRST_ADMIN_UID", "");
        let first_admin_email = env_or_default("FIRST_ADMIN_EMAIL", "admin@sekolah.local");
        let first_admin_name = env_or_default("FIRST_ADMIN_NAME", "Administrator");

        let score_decimals =
            parse_u32("GRADE_SCORE_DECIMALS", env_or_default("GRADE_SCORE_DECIMALS", "1"))?;

        let log_level = env_or_default("SEKOLAH_LOG_LEVEL", "info");
        let json =
            env_optional("SEKOLAH_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str, login_path },
            security: SecuritySettings {
                secret_key,
                session_expire_minutes,
                algorithm,
                cookie_name,
                cookie_secure,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            admin: AdminSettings { first_admin_uid, first_admin_email, first_admin_name },
            grading: GradingSettings { score_decimals },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn grading(&self) -> GradingSettings {
        self.grading
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.grading.score_decimals > MAX_SCORE_DECIMALS {
            return Err(ConfigError::InvalidValue {
                field: "GRADE_SCORE_DECIMALS",
                value: self.grading.score_decimals.to_string(),
            });
        }

        if self.security.session_expire_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SESSION_EXPIRE_MINUTES",
                value: "0".to_string(),
            });
        }

        if self.security.cookie_name.chars().any(|ch| !(ch.is_ascii_alphanumeric() || ch == '_')) {
            return Err(ConfigError::InvalidValue {
                field: "SESSION_COOKIE_NAME",
                value: self.security.cookie_name.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_admin_uid.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_UID"));
        }

        Ok(())
    }
}
