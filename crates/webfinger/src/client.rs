//! WebFinger lookup client.

use std::sync::LazyLock;

use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug, info, instrument, warn};
use url::Url;

use crate::error::StatusError;
use crate::jrd::Jrd;
use crate::resource::Resource;
use crate::transport::{HttpResponse, ReqwestTransport, Transport};

/// Client used by [`lookup`].
static DEFAULT_CLIENT: LazyLock<Client> = LazyLock::new(Client::new);

/// Look up the JRD for an identifier using the default client.
///
/// The default client only queries over HTTPS.
pub async fn lookup(identifier: &str, rels: &[&str]) -> crate::Result<Jrd> {
    DEFAULT_CLIENT.lookup(identifier, rels).await
}

/// A WebFinger client.
///
/// # Example
///
/// ```no_run
/// use webfinger::Client;
///
/// # async fn example() -> Result<(), webfinger::Error> {
/// let client = Client::new();
/// let jrd = client.lookup("bob@example.com", &["http://webfinger.net/rel/avatar"]).await?;
///
/// if let Some(avatar) = jrd.link_by_rel("http://webfinger.net/rel/avatar") {
///     println!("{:?}", avatar.href);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    transport: T,
    allow_http: bool,
    dispatch: Option<Dispatch>,
}

impl Client<ReqwestTransport> {
    /// Create a client with the default `reqwest` transport.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for Client<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            allow_http: false,
            dispatch: None,
        }
    }

    /// Allow a single plain HTTP attempt when HTTPS is refused.
    ///
    /// WebFinger requires HTTPS, so this should only be enabled for
    /// development.
    pub fn allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Send this client's log events to `dispatch` instead of the global
    /// subscriber.
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = Some(dispatch.into());
        self
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up the JRD for an identifier.
    ///
    /// If `rels` is not empty only those relations are requested, though
    /// servers are not obliged to filter.
    pub async fn lookup(&self, identifier: &str, rels: &[&str]) -> crate::Result<Jrd> {
        let resource = Resource::parse(identifier)?;
        self.lookup_resource(&resource, rels).await
    }

    /// Look up the JRD for an already parsed resource.
    pub async fn lookup_resource(&self, resource: &Resource, rels: &[&str]) -> crate::Result<Jrd> {
        match &self.dispatch {
            Some(dispatch) => {
                self.resolve(resource, rels)
                    .with_subscriber(dispatch.clone())
                    .await
            }
            None => self.resolve(resource, rels).await,
        }
    }

    #[instrument(skip(self, resource, rels), fields(resource = %resource))]
    async fn resolve(&self, resource: &Resource, rels: &[&str]) -> crate::Result<Jrd> {
        info!("Looking up WebFinger data for {}", resource);

        let url = resource.jrd_url(rels)?;
        let response = self.fetch(url).await?;

        if !response.status.is_success() {
            return Err(StatusError::new(
                response.status.as_u16(),
                response.status.canonical_reason().map(str::to_string),
            )
            .into());
        }

        let jrd = Jrd::from_slice(&response.body)?;
        debug!(links = jrd.links.len(), "decoded JRD");
        Ok(jrd)
    }

    /// GET the query URL, falling back to plain HTTP once if permitted.
    async fn fetch(&self, mut url: Url) -> crate::Result<HttpResponse> {
        info!("GET {}", url);

        match self.transport.get(&url).await {
            Ok(response) => Ok(response),
            Err(err) if self.allow_http && err.permits_insecure_retry() => {
                if url.set_scheme("http").is_err() {
                    return Err(err.into());
                }
                warn!(error = %err, "HTTPS unavailable, retrying over HTTP");
                info!("GET {}", url);
                Ok(self.transport.get(&url).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
