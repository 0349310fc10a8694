//! PostgreSQL driver built on `tokio-postgres`.
//!
//! [`PgConnector`] reports [`Dialect::Postgres`], so builders emit `$n` placeholders.
//! Timestamps bound to or read from `timestamptz` columns are interpreted in the
//! connector's time zone, the same offset the session is switched to on connect.

use crate::config::default_time_zone;
use crate::driver::{Connection, Connector, DriverError, RawRow, ResultStream};
use crate::error::{CrudError, CrudResult};
use crate::stmt::Dialect;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use futures_util::TryStreamExt;
use std::error::Error;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};

/// Connection parameters for [`PgConnector`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Session time zone, applied with `SET TIME ZONE` after connecting.
    pub time_zone: FixedOffset,
    /// TLS is not available through this connector; `true` fails with a configuration error.
    pub ssl: bool,
    pub connect_timeout: Option<Duration>,
    pub application_name: Option<String>,
}

impl ConnectOptions {
    pub fn new(host: &str, port: u16, database: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            database: database.to_string(),
            user: user.to_string(),
            password: None,
            time_zone: default_time_zone(),
            ssl: false,
            connect_timeout: None,
            application_name: None,
        }
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn time_zone(mut self, offset: FixedOffset) -> Self {
        self.time_zone = offset;
        self
    }

    pub fn ssl(mut self, enabled: bool) -> Self {
        self.ssl = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn application_name(mut self, name: &str) -> Self {
        self.application_name = Some(name.to_string());
        self
    }

    /// Translate into a `tokio_postgres::Config`.
    pub fn to_pg_config(&self) -> CrudResult<tokio_postgres::Config> {
        if self.ssl {
            return Err(CrudError::configuration(
                "TLS is not supported by PgConnector; implement Connector for a TLS client",
            ));
        }
        if self.host.is_empty() || self.database.is_empty() || self.user.is_empty() {
            return Err(CrudError::configuration(
                "host, database and user are required",
            ));
        }

        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .ssl_mode(SslMode::Disable);
        if let Some(password) = &self.password {
            config.password(password);
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        Ok(config)
    }
}

/// Opens one unpooled `tokio-postgres` connection per call.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: tokio_postgres::Config,
    time_zone: FixedOffset,
}

impl PgConnector {
    pub fn new(options: &ConnectOptions) -> CrudResult<Self> {
        Ok(Self {
            config: options.to_pg_config()?,
            time_zone: options.time_zone,
        })
    }

    /// Build from a `postgres://` URL or key/value connection string.
    pub fn from_url(url: &str) -> CrudResult<Self> {
        let config = url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| CrudError::configuration(format!("invalid connection string: {e}")))?;
        Ok(Self {
            config,
            time_zone: default_time_zone(),
        })
    }

    pub fn time_zone(mut self, offset: FixedOffset) -> Self {
        self.time_zone = offset;
        self
    }
}

impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, DriverError> {
        let (client, connection) = self.config.connect(NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(target: "crudmap.session", error = %e, "postgres connection error");
            }
        });

        let set_zone = format!(
            "SET TIME ZONE INTERVAL '{}' HOUR TO MINUTE",
            self.time_zone
        );
        client.batch_execute(&set_zone).await?;

        Ok(PgConnection {
            client,
            driver,
            time_zone: self.time_zone,
        })
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

/// A single `tokio-postgres` client and the task driving its socket.
pub struct PgConnection {
    client: tokio_postgres::Client,
    driver: JoinHandle<()>,
    time_zone: FixedOffset,
}

/// A [`Value`] bound for PostgreSQL, carrying the offset a `timestamptz` needs.
#[derive(Debug)]
struct PgParam<'a> {
    value: &'a Value,
    time_zone: FixedOffset,
}

fn bind_params(params: &[Value], time_zone: FixedOffset) -> Vec<PgParam<'_>> {
    params
        .iter()
        .map(|value| PgParam { value, time_zone })
        .collect()
}

impl Connection for PgConnection {
    type Row = PgRow;

    async fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<ResultStream<PgRow>, DriverError> {
        let statement = self.client.prepare(sql).await?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let binds = bind_params(params, self.time_zone);
        let time_zone = self.time_zone;
        let rows = self
            .client
            .query_raw(&statement, binds.iter().map(|p| p as &(dyn ToSql + Sync)))
            .await?
            .map_ok(move |row| PgRow { row, time_zone })
            .map_err(|e| Box::new(e) as DriverError);
        Ok(ResultStream::new(columns, rows))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        let binds = bind_params(params, self.time_zone);
        let refs: Vec<&(dyn ToSql + Sync)> =
            binds.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(self.client.execute(sql, &refs).await?)
    }

    async fn close(self) -> Result<(), DriverError> {
        let PgConnection { client, driver, .. } = self;
        drop(client);
        driver.await?;
        Ok(())
    }
}

/// A result row plus the offset `timestamptz` values are converted to.
pub struct PgRow {
    row: tokio_postgres::Row,
    time_zone: FixedOffset,
}

/// Wall-clock time of `utc` at `offset`.
fn local_time(utc: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    utc.with_timezone(&offset).naive_local()
}

impl RawRow for PgRow {
    fn value_at(&self, index: usize) -> Result<Value, DriverError> {
        let zoned = self
            .row
            .columns()
            .get(index)
            .is_some_and(|c| *c.type_() == Type::TIMESTAMPTZ);
        if zoned {
            let utc: Option<DateTime<Utc>> = self.row.try_get(index)?;
            return Ok(utc.map_or(Value::Null, |t| {
                Value::Timestamp(local_time(t, self.time_zone))
            }));
        }
        Ok(self.row.try_get::<_, Value>(index)?)
    }
}

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self.value {
            Value::Timestamp(v) if *ty == Type::TIMESTAMPTZ => self
                .time_zone
                .from_local_datetime(v)
                .single()
                .ok_or_else(|| format!("{v} has no single instant at {}", self.time_zone))?
                .to_sql_checked(ty, out),
            other => other.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.as_str().to_sql_checked(ty, out),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::DATE => v.date().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
        }
    }

    // Type compatibility depends on the variant, so it is checked per value in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            // UTC wall-clock time; `PgRow` converts to the session offset instead.
            Type::TIMESTAMPTZ => Value::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc()),
            Type::DATE => Value::Timestamp(NaiveDate::from_sql(ty, raw)?.and_time(NaiveTime::MIN)),
            _ if <&str as FromSql>::accepts(ty) => Value::Text(<&str>::from_sql(ty, raw)?.to_string()),
            _ => return Err(format!("unsupported column type {ty}").into()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
