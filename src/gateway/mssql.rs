//! SQL Server gateway over TDS.

use super::{Cell, Gateway, Row};
use crate::core::config::ConnectionConfig;
use crate::core::{ProbeError, Result};
use std::time::{Duration, Instant};
use tiberius::{AuthMethod, Client, ColumnData, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

const APPLICATION_NAME: &str = "mssqlprobe";

/// Everything needed to reach and log in to a server.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Server address
    pub host: String,
    /// Named instance, resolved through the SQL Server Browser service
    pub instance: Option<String>,
    /// TCP port; ignored when an instance is given
    pub port: Option<u16>,
    /// SQL Server login
    pub user: String,
    /// SQL Server password
    pub password: String,
    /// Database selected at login
    pub database: String,
    /// Budget for TCP connect plus login
    pub connect_timeout: Duration,
    /// Skip certificate validation
    pub trust_server_certificate: bool,
    /// Port used when neither `port` nor `instance` is set
    pub default_port: u16,
}

impl ConnectionSettings {
    /// Build settings from CLI values and the connection section of the config.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        config: &ConnectionConfig,
    ) -> Self {
        Self {
            host: host.into(),
            instance: None,
            port: None,
            user: user.into(),
            password: password.into(),
            database: config.initial_database.clone(),
            connect_timeout: config.connect_timeout,
            trust_server_certificate: config.trust_server_certificate,
            default_port: config.default_port,
        }
    }

    /// Set the named instance
    pub fn with_instance(mut self, instance: Option<String>) -> Self {
        self.instance = instance;
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// The server as written on the command line: `host`, `host\instance`
    /// or `host:port`. Rate-of-change baselines are keyed on this.
    pub fn host_identity(&self) -> String {
        match (&self.instance, self.port) {
            (Some(instance), _) => format!("{}\\{}", self.host, instance),
            (None, Some(port)) => format!("{}:{}", self.host, port),
            (None, None) => self.host.clone(),
        }
    }

    fn tds_config(&self) -> tiberius::Config {
        let mut config = tiberius::Config::new();
        config.host(&self.host);
        match &self.instance {
            Some(instance) => config.instance_name(instance),
            None => config.port(self.port.unwrap_or(self.default_port)),
        }
        config.database(&self.database);
        config.application_name(APPLICATION_NAME);
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if self.trust_server_certificate {
            config.trust_cert();
        }
        config
    }
}

/// Gateway holding one open TDS connection.
pub struct MssqlGateway {
    client: Client<Compat<TcpStream>>,
}

impl MssqlGateway {
    /// Connect and log in, returning the gateway and how long that took.
    pub async fn connect(settings: &ConnectionSettings) -> Result<(Self, Duration)> {
        let start = Instant::now();
        let identity = settings.host_identity();
        tracing::debug!(server = %identity, database = %settings.database, "Connecting");

        let client = tokio::time::timeout(settings.connect_timeout, Self::open(settings))
            .await
            .map_err(|_| {
                ProbeError::connection(format!(
                    "Timed out connecting to {} after {}s",
                    identity,
                    settings.connect_timeout.as_secs_f64()
                ))
            })??;

        let elapsed = start.elapsed();
        tracing::debug!(server = %identity, elapsed_ms = elapsed.as_millis() as u64, "Connected");
        Ok((Self { client }, elapsed))
    }

    async fn open(settings: &ConnectionSettings) -> Result<Client<Compat<TcpStream>>> {
        let config = settings.tds_config();
        let tcp = Self::tcp(&config, settings.instance.is_some()).await?;

        match Client::connect(config, tcp.compat_write()).await {
            Ok(client) => Ok(client),
            // Azure and availability groups may redirect the login.
            Err(tiberius::error::Error::Routing { host, port }) => {
                tracing::debug!(%host, port, "Login redirected");
                let mut config = settings.tds_config();
                config.host(&host);
                config.port(port);
                let tcp = Self::tcp(&config, false).await?;
                Ok(Client::connect(config, tcp.compat_write()).await?)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn tcp(config: &tiberius::Config, named_instance: bool) -> Result<TcpStream> {
        let tcp = if named_instance {
            TcpStream::connect_named(config).await?
        } else {
            TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| ProbeError::connection(e.to_string()))?
        };
        tcp.set_nodelay(true)
            .map_err(|e| ProbeError::connection(e.to_string()))?;
        Ok(tcp)
    }

    /// Close the connection politely.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Gateway for MssqlGateway {
    async fn execute(&mut self, query: &str) -> Result<Vec<Row>> {
        tracing::debug!(%query, "Executing");
        let rows = self.client.simple_query(query).await?.into_first_result().await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_from_column).collect())
            .collect())
    }
}

fn cell_from_column(data: ColumnData<'static>) -> Cell {
    match data {
        ColumnData::U8(v) => v.map_or(Cell::Null, |v| Cell::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(Cell::Null, |v| Cell::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(Cell::Null, |v| Cell::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(Cell::Null, Cell::Int),
        ColumnData::F32(v) => v.map_or(Cell::Null, |v| Cell::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(Cell::Null, Cell::Float),
        ColumnData::Bit(v) => v.map_or(Cell::Null, Cell::Bool),
        ColumnData::String(v) => v.map_or(Cell::Null, |s| Cell::Text(s.into_owned())),
        ColumnData::Numeric(v) => v.map_or(Cell::Null, |n| {
            Cell::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
        }),
        other => Cell::Other(format!("{:?}", other)),
    }
}
