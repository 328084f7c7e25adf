use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mongodb::options::{ClientOptions, Credential, ServerAddress, WriteConcern};
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::configuration::MongoConfiguration;
use super::write_concern::WriteConcernLevel;
use crate::global::error::MongoError;

/// Turns a [`MongoConfiguration`] into a driver client.
pub struct ClientFactory;

impl ClientFactory {
    /// Build driver options without touching the network.
    pub fn options(config: &MongoConfiguration) -> Result<ClientOptions, MongoError> {
        Self::options_with_level(config).map(|(options, _)| options)
    }

    fn options_with_level(config: &MongoConfiguration) -> Result<(ClientOptions, WriteConcernLevel), MongoError> {
        let level = config.validate()?;

        // seed list, in configured order
        let hosts = config
            .seeds
            .iter()
            .map(|seed| seed.address())
            .collect::<Result<Vec<ServerAddress>, MongoError>>()?;

        info!(count = hosts.len(), "Found mongo seed servers");
        for host in &hosts {
            info!(seed = %host, "Found mongo seed server");
        }

        let credential = config.credentials.as_ref().map(|credentials| {
            let mut credential = Credential::default();
            credential.username = Some(credentials.user_name.clone());
            credential.password = Some(credentials.password.expose().to_string());
            credential.source = Some(config.database.clone());
            credential
        });

        match &credential {
            Some(credential) => info!(
                user = credential.username.as_deref().unwrap_or_default(),
                database = credential.source.as_deref().unwrap_or_default(),
                "Found mongo credential"
            ),
            None => info!(count = 0, "Found mongo credentials"),
        }

        let mut options = ClientOptions::default();
        options.hosts = hosts;
        options.credential = credential;
        options.write_concern = Some(level.to_write_concern());
        options.default_database = Some(config.database.clone());
        options.app_name = config.app_name.clone();
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.server_selection_timeout_secs));

        info!(database = %config.database, write_concern = %level, "Mongo database configured");
        Ok((options, level))
    }

    /// Build a client handle. Configuration is fully validated before any
    /// network activity; the driver connects lazily afterwards.
    pub async fn build(config: &MongoConfiguration) -> Result<ClientHandle, MongoError> {
        let (options, level) = Self::options_with_level(config)?;

        if config.resolve_seeds {
            resolve_seeds(&options.hosts).await?;
        }

        let client = Client::with_options(options.clone())
            .map_err(|e| MongoError::Connection(format!("could not configure MongoDB client: {}", e)))?;

        debug!(database = %config.database, "Mongo client created");

        Ok(ClientHandle {
            inner: Arc::new(HandleInner {
                client,
                database: config.database.clone(),
                seeds: options.hosts,
                credential: options.credential,
                write_concern: level.to_write_concern(),
                write_concern_level: level,
                stopped: AtomicBool::new(false),
            }),
        })
    }
}

async fn resolve_seeds(hosts: &[ServerAddress]) -> Result<(), MongoError> {
    for host in hosts {
        let address = host.to_string();
        let mut resolved = tokio::net::lookup_host(address.as_str())
            .await
            .map_err(|e| MongoError::Connection(format!("could not resolve seed server {}: {}", address, e)))?;

        match resolved.next() {
            Some(socket) => debug!(seed = %address, resolved = %socket, "Resolved mongo seed server"),
            None => {
                return Err(MongoError::Connection(format!(
                    "seed server {} resolved to no addresses",
                    address
                )));
            }
        }
    }
    Ok(())
}

/// Shared handle to the process-wide MongoDB client.
///
/// Clones share the same driver client and the same stopped flag.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    client: Client,
    database: String,
    seeds: Vec<ServerAddress>,
    credential: Option<Credential>,
    write_concern: WriteConcern,
    write_concern_level: WriteConcernLevel,
    stopped: AtomicBool,
}

impl ClientHandle {
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// The configured database
    pub fn database(&self) -> Database {
        self.inner.client.database(&self.inner.database)
    }

    pub fn database_name(&self) -> &str {
        &self.inner.database
    }

    pub fn seeds(&self) -> &[ServerAddress] {
        &self.inner.seeds
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.inner.credential.as_ref()
    }

    pub fn write_concern(&self) -> &WriteConcern {
        &self.inner.write_concern
    }

    pub fn write_concern_level(&self) -> WriteConcernLevel {
        self.inner.write_concern_level
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Flip the stopped flag. Returns true only for the call that flipped it.
    pub(crate) fn mark_stopped(&self) -> bool {
        !self.inner.stopped.swap(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("database", &self.inner.database)
            .field("seeds", &self.inner.seeds)
            .field(
                "user",
                &self.inner.credential.as_ref().and_then(|c| c.username.as_deref()),
            )
            .field("write_concern", &self.inner.write_concern_level)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongo::configuration::ServerConfiguration;
    use mongodb::options::Acknowledgment;

    fn example_config() -> MongoConfiguration {
        MongoConfiguration::new(
            "app",
            vec![
                ServerConfiguration::new("db1", 27017),
                ServerConfiguration::new("db2", 27017),
            ],
        )
        .with_credentials("svc", "pw")
        .with_write_concern("MAJORITY")
    }

    fn seeds(hosts: &[ServerAddress]) -> Vec<String> {
        hosts.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_options_keep_seed_order() {
        let config = MongoConfiguration::new(
            "app",
            vec![
                ServerConfiguration::new("db3", 27019),
                ServerConfiguration::new("db1", 27017),
                ServerConfiguration::new("db2", 27018),
            ],
        );

        let options = ClientFactory::options(&config).unwrap();
        assert_eq!(seeds(&options.hosts), vec!["db3:27019", "db1:27017", "db2:27018"]);
    }

    #[test]
    fn test_options_without_credentials() {
        let config = MongoConfiguration::new("app", vec![ServerConfiguration::default()]);

        let options = ClientFactory::options(&config).unwrap();
        assert!(options.credential.is_none());
        assert_eq!(options.write_concern.unwrap().w, Some(Acknowledgment::Nodes(1)));
    }

    #[test]
    fn test_options_with_credentials() {
        let options = ClientFactory::options(&example_config()).unwrap();

        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("svc"));
        assert_eq!(credential.password.as_deref(), Some("pw"));
        assert_eq!(credential.source.as_deref(), Some("app"));
        assert_eq!(options.default_database.as_deref(), Some("app"));
    }

    #[test]
    fn test_options_apply_tuning() {
        let config = example_config().with_app_name("billing");

        let options = ClientFactory::options(&config).unwrap();
        assert_eq!(options.app_name.as_deref(), Some("billing"));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_options_reject_bogus_write_concern() {
        let config = example_config().with_write_concern("BOGUS");
        assert!(matches!(
            ClientFactory::options(&config),
            Err(MongoError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_build_example_config() {
        let handle = ClientFactory::build(&example_config()).await.unwrap();

        assert_eq!(seeds(handle.seeds()), vec!["db1:27017", "db2:27017"]);
        assert_eq!(handle.credential().unwrap().username.as_deref(), Some("svc"));
        assert_eq!(handle.credential().unwrap().source.as_deref(), Some("app"));
        assert_eq!(handle.write_concern().w, Some(Acknowledgment::Majority));
        assert_eq!(handle.write_concern_level(), WriteConcernLevel::Majority);
        assert_eq!(handle.database_name(), "app");
        assert_eq!(handle.database().name(), "app");
        assert!(!handle.is_stopped());
    }

    #[tokio::test]
    async fn test_build_accepts_every_write_concern() {
        for identifier in WriteConcernLevel::identifiers() {
            let config = example_config().with_write_concern(*identifier);
            let handle = ClientFactory::build(&config).await;
            assert!(handle.is_ok(), "{identifier} should build");
        }
    }

    #[tokio::test]
    async fn test_build_fails_before_network_on_bogus_write_concern() {
        // resolving this seed would fail, so a configuration error proves
        // validation ran first
        let mut config = example_config().with_write_concern("BOGUS");
        config.seeds = vec![ServerConfiguration::new("seed.invalid", 27017)];
        config.resolve_seeds = true;

        assert!(matches!(
            ClientFactory::build(&config).await,
            Err(MongoError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_build_reports_unresolvable_seed() {
        let mut config = MongoConfiguration::new("app", vec![ServerConfiguration::new("seed.invalid", 27017)]);
        config.resolve_seeds = true;

        assert!(matches!(
            ClientFactory::build(&config).await,
            Err(MongoError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_stopped_flips_once() {
        let handle = ClientFactory::build(&example_config()).await.unwrap();
        let clone = handle.clone();

        assert!(handle.mark_stopped());
        assert!(!clone.mark_stopped());
        assert!(clone.is_stopped());
    }
}
