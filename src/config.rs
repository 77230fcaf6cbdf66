use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://funbox.db";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origin. Any origin is allowed when unset.
    pub client_url: Option<String>,
    pub serverless: bool,
}

impl ServerConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let host = match env::var("HOST") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("HOST is not an IP address: {}", raw)))?,
            Err(_) => IpAddr::from([0, 0, 0, 0]),
        };
        let port = parse_port(env::var("PORT").ok())?;
        let client_url = env::var("CLIENT_URL").ok().filter(|s| !s.trim().is_empty());
        let serverless = env::var("VERCEL").is_ok();

        Ok(Self {
            database_url,
            host,
            port,
            client_url,
            serverless,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct KioskConfig {
    pub api_url: String,
    /// Serial device node. Keyboard fallback on stdin when unset.
    pub device: Option<String>,
    pub student_id: String,
    pub meeting_id: i64,
}

impl KioskConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let api_url = env::var("API_URL")
            .or_else(|_| env::var("VITE_API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let device = env::var("FUNBOX_PORT").ok().filter(|s| !s.trim().is_empty());
        let student_id = env::var("STUDENT_ID")
            .map_err(|_| AppError::BadRequest("STUDENT_ID is not set".to_string()))?;
        let meeting_id = env::var("MEETING_ID")
            .map_err(|_| AppError::BadRequest("MEETING_ID is not set".to_string()))?
            .parse()
            .map_err(|_| AppError::BadRequest("MEETING_ID must be a number".to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            device,
            student_id,
            meeting_id,
        })
    }
}

fn parse_port(raw: Option<String>) -> Result<u16, AppError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest(format!("PORT is not a valid port: {}", raw))),
        None => Ok(DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None).expect("default port"), DEFAULT_PORT);
        assert_eq!(parse_port(Some(" 8080 ".to_string())).expect("port"), 8080);
        assert!(parse_port(Some("eighty".to_string())).is_err());
    }
}
