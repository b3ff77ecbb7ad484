use crate::app::ScyllaConfig;
use crate::utils::logger::log_fatal;
use scylla::client::caching_session::CachingSession;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::time::Duration;

/// Clients live for the whole runtime of the service and wrap connections to external systems.
#[allow(async_fn_in_trait)]
pub trait Client<'a> {
    type Cfg;

    async fn init_client(config: Self::Cfg) -> Self;
}

impl<'a> Client<'a> for CachingSession {
    type Cfg = &'a ScyllaConfig;

    async fn init_client(config: Self::Cfg) -> Self {
        let session: Session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .connection_timeout(Duration::from_secs(3))
            .use_keyspace(&config.keyspace, false)
            .build()
            .await
            .unwrap_or_else(|e| {
                log_fatal(format!("Unable to connect to scylla hosts: {:?}", config.hosts));
                panic!("Unable to connect to scylla hosts: {:?}. \nError: {}", config.hosts, e)
            });

        CachingSession::from(session, config.cache_size)
    }
}
