// Endpoint table for the cloud messaging service.
//
// Each wire operation lives on its own host in production, so the table
// carries one full URL per operation rather than a single base. Tests
// rebase everything onto one mock server via `with_base`.

use url::Url;

const AUTHENTICATE_PATH: &str = "/v1/mobile/authenticate";
const LOGIN_PATH: &str = "/v2/user/login";
const RETRIEVE_PATH: &str = "/v1/messages/retrieve";
const REQUEST_DATA_PATH: &str = "/v1/messages/requestData";
const PUBLISH_PATH: &str = "/v1/messages/publish";

/// One URL per wire operation.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Certificate exchange (step one of the handshake).
    pub authenticate: Url,
    /// Credential login (step two, requires the certificate token).
    pub login: Url,
    /// Queued-message retrieval.
    pub retrieve: Url,
    /// Data-path subscription requests.
    pub request_data: Url,
    /// Command publishes.
    pub publish: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authenticate: parse("https://ic3messaging.myicomfort.com/v1/mobile/authenticate"),
            login: parse("https://ic3messaging.myicomfort.com/v2/user/login"),
            retrieve: parse("https://icretrieveapi.myicomfort.com/v1/messages/retrieve"),
            request_data: parse("https://icrequestdataapi.myicomfort.com/v1/messages/requestData"),
            publish: parse("https://icpublishapi.myicomfort.com/v1/messages/publish"),
        }
    }
}

impl Endpoints {
    /// Rebase every operation onto a single host.
    ///
    /// Production traffic never does this; it exists so tests can point the
    /// whole table at one mock server.
    pub fn with_base(base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            authenticate: base.join(AUTHENTICATE_PATH)?,
            login: base.join(LOGIN_PATH)?,
            retrieve: base.join(RETRIEVE_PATH)?,
            request_data: base.join(REQUEST_DATA_PATH)?,
            publish: base.join(PUBLISH_PATH)?,
        })
    }
}

fn parse(url: &str) -> Url {
    Url::parse(url).expect("static endpoint URL is valid")
}
