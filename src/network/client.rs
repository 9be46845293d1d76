//! HTTP client for the classifieds backend

use super::error::ApiError;
use super::session::{Session, SessionStore};
use crate::config::Settings;
use crate::contact::EmailMessage;
use crate::models::{
    Advertisement, AdvertisementResponse, Credentials, LoginResponse, NewAdvertisement,
    Registration, User, UserUpdate,
};
use crate::search::{compose_query_string, SearchParam, SearchParams};
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Header carrying the session token
const USER_TOKEN_HEADER: &str = "user-token";

/// Page size used when loading whole per-user collections
const COLLECTION_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched for one collection
const MAX_COLLECTION_PAGES: u32 = 50;

/// A photo waiting to be uploaded
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. "jpg"
    pub extension: String,
}

impl Photo {
    /// Content-addressed file name, so re-uploading the same photo overwrites it
    pub fn file_name(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        format!("{:x}.{}", digest, self.extension.trim_start_matches('.'))
    }
}

/// Backend REST client
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    table: String,
    photo_folder: String,
    sort_by: String,
    extra_headers: HashMap<String, String>,
    session: SessionStore,
}

impl BackendClient {
    /// Create a client with default settings
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut settings = Settings::default();
        settings.backend.api_host = base_url.to_string();
        Self::with_settings(&settings, SessionStore::new())
    }

    /// Create a client from settings, sharing `session` with the caller
    pub fn with_settings(settings: &Settings, session: SessionStore) -> Result<Self, ApiError> {
        let outgoing = &settings.outgoing;
        let mut builder = Client::builder()
            .redirect(redirect::Policy::limited(outgoing.max_redirects))
            .gzip(true);

        if let Some(seconds) = outgoing.request_timeout {
            builder = builder.timeout(Duration::from_secs_f64(seconds));
        }

        // SSL verification
        if !outgoing.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = outgoing.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = outgoing.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = outgoing.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;
        let base_url = Url::parse(&settings.backend.base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BadUrl(settings.backend.base_url()));
        }

        Ok(Self {
            client,
            base_url,
            table: settings.backend.advertisement_table.clone(),
            photo_folder: settings.backend.photo_folder.clone(),
            sort_by: settings.search.sort_by.clone(),
            extra_headers: outgoing.extra_headers.clone(),
            session,
        })
    }

    /// Session shared with this client
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Base URL with extra path segments appended
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BadUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        // The base path carries the API key; log only the endpoint part
        let endpoint = url
            .path()
            .strip_prefix(self.base_url.path().trim_end_matches('/'))
            .unwrap_or("");
        debug!("{} {}", method, endpoint);
        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        for (key, value) in &self.extra_headers {
            builder = builder.header(key, value);
        }

        if let Some(token) = self.session.token() {
            builder = builder.header(USER_TOKEN_HEADER, token);
        }

        builder
    }

    /// Send and return the body of a successful response
    async fn send_raw(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Backend answered {}", status);
            return Err(ApiError::from_status(status.as_u16(), text));
        }

        Ok(text)
    }

    /// Send and decode a JSON body
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send_raw(builder).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        self.send(self.request(Method::GET, url)).await
    }

    async fn with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Unexpected(e.to_string()))?;
        self.send(self.request(method, url).body(payload)).await
    }

    /// Listing query parameters for a search
    fn listing_query(&self, params: &SearchParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("pageSize", params.page_size.to_string()),
            ("offset", params.offset.to_string()),
        ];
        if !self.sort_by.is_empty() {
            query.push(("sortBy", self.sort_by.clone()));
        }
        let where_clause = compose_query_string(params.params());
        if !where_clause.is_empty() {
            query.push(("where", where_clause));
        }
        query
    }

    /// One page of listings matching `params`
    pub async fn fetch_advertisements(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<Advertisement>, ApiError> {
        let responses: Vec<AdvertisementResponse> = self
            .get(&["data", self.table.as_str()], &self.listing_query(params))
            .await?;
        Ok(responses.into_iter().map(Advertisement::from_response).collect())
    }

    /// Number of listings matching `params`
    pub async fn count_advertisements(&self, params: &[SearchParam]) -> Result<u64, ApiError> {
        let where_clause = compose_query_string(params);
        let query = if where_clause.is_empty() {
            vec![]
        } else {
            vec![("where", where_clause)]
        };
        self.get(&["data", self.table.as_str(), "count"], &query).await
    }

    /// A single listing
    pub async fn fetch_advertisement(&self, object_id: &str) -> Result<Advertisement, ApiError> {
        let response: AdvertisementResponse = self.get(&["data", self.table.as_str(), object_id], &[]).await?;
        Ok(Advertisement::from_response(response))
    }

    /// Create a listing owned by the signed-in user
    pub async fn create_advertisement(
        &self,
        draft: &NewAdvertisement,
    ) -> Result<Advertisement, ApiError> {
        let response: AdvertisementResponse = self
            .with_body(Method::POST, &["data", self.table.as_str()], draft)
            .await?;
        info!("Created advertisement {}", response.object_id);
        Ok(Advertisement::from_response(response))
    }

    /// Upload photos, then create the listing referencing them
    pub async fn publish_advertisement(
        &self,
        mut draft: NewAdvertisement,
        photos: Vec<Photo>,
    ) -> Result<Advertisement, ApiError> {
        for photo in &photos {
            let url = self.upload_photo(photo).await?;
            draft.photos.push(url);
        }
        self.create_advertisement(&draft).await
    }

    pub async fn delete_advertisement(&self, object_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["data", self.table.as_str(), object_id])?;
        self.send_raw(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Every listing matching `where_clause`, one page at a time until a short page
    async fn fetch_where(&self, where_clause: String) -> Result<Vec<Advertisement>, ApiError> {
        let mut ads = Vec::new();
        for page in 0..MAX_COLLECTION_PAGES {
            let query = [
                ("pageSize", COLLECTION_PAGE_SIZE.to_string()),
                ("offset", (page * COLLECTION_PAGE_SIZE).to_string()),
                ("sortBy", self.sort_by.clone()),
                ("where", where_clause.clone()),
            ];
            let responses: Vec<AdvertisementResponse> =
                self.get(&["data", self.table.as_str()], &query).await?;
            let full = responses.len() >= COLLECTION_PAGE_SIZE as usize;
            ads.extend(responses.into_iter().map(Advertisement::from_response));
            if !full {
                return Ok(ads);
            }
        }
        warn!("Stopped after {} listings for {}", ads.len(), where_clause);
        Ok(ads)
    }

    /// Listings the user marked as favorite
    pub async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<Advertisement>, ApiError> {
        self.fetch_where(format!("Users[favorites].objectId = '{}'", escape(user_id)))
            .await
    }

    /// Listings the user published
    pub async fn fetch_own(&self, user_id: &str) -> Result<Vec<Advertisement>, ApiError> {
        self.fetch_where(format!("ownerId = '{}'", escape(user_id))).await
    }

    pub async fn add_favorite(&self, user_id: &str, object_id: &str) -> Result<(), ApiError> {
        let _: u64 = self
            .with_body(
                Method::PUT,
                &["data", "Users", user_id, "favorites"],
                &[object_id],
            )
            .await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: &str, object_id: &str) -> Result<(), ApiError> {
        let _: u64 = self
            .with_body(
                Method::DELETE,
                &["data", "Users", user_id, "favorites"],
                &[object_id],
            )
            .await?;
        Ok(())
    }

    /// Sign in and store the session
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let response: LoginResponse = self
            .with_body(Method::POST, &["users", "login"], credentials)
            .await?;
        let session = Session {
            user: response.user,
            token: response.user_token,
        };
        self.session.set(session.clone());
        info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        self.with_body(Method::POST, &["users", "register"], registration)
            .await
    }

    /// Sign out. The local session is dropped even if the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", "logout"])?;
        let result = self.send_raw(self.request(Method::GET, url)).await;
        self.session.clear();
        result.map(|_| ())
    }

    pub async fn restore_password(&self, email: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", "restorepassword", email])?;
        self.send_raw(self.request(Method::GET, url)).await?;
        Ok(())
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.get(&["data", "Users", user_id], &[]).await
    }

    /// Update the profile; the stored session follows when it is the same user
    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        let user: User = self
            .with_body(Method::PUT, &["users", user_id], update)
            .await?;
        if self.session.user().map_or(false, |u| u.object_id == user.object_id) {
            self.session.update_user(user.clone());
        }
        Ok(user)
    }

    /// Upload a photo and return its public URL
    pub async fn upload_photo(&self, photo: &Photo) -> Result<String, ApiError> {
        let file_name = photo.file_name();
        let mut url = self.endpoint(&["files", "binary", self.photo_folder.as_str(), file_name.as_str()])?;
        url.query_pairs_mut().append_pair("overwrite", "true");

        let encoded = base64::engine::general_purpose::STANDARD.encode(&photo.bytes);
        let text = self
            .send_raw(self.request(Method::PUT, url).body(encoded))
            .await?;

        // The backend answers with the URL, sometimes JSON-quoted
        let file_url = serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string());
        if Url::parse(&file_url).is_err() {
            return Err(ApiError::Decoding(format!("not a file url: {}", file_url)));
        }
        debug!("Uploaded photo {}", file_name);
        Ok(file_url)
    }

    pub async fn send_email(&self, message: &EmailMessage) -> Result<(), ApiError> {
        let url = self.endpoint(&["messaging", "email"])?;
        let payload = serde_json::to_vec(message).map_err(|e| ApiError::Unexpected(e.to_string()))?;
        self.send_raw(self.request(Method::POST, url).body(payload))
            .await?;
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
