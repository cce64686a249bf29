use crate::pinning::protocol::{validate, Error, NetworkError, Payload};
use reqwest::{
  multipart::{Form, Part},
  Client, Url,
};
use serde::Deserialize;

/// Content handed to the upload service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
  /// A local file, sent under its file name.
  File { name: String, data: Vec<u8> },
  /// Text typed by the user, sent as `text/plain`.
  Text(String),
}

impl Upload {
  pub fn len(&self) -> u64 {
    match self {
      Self::File { data, .. } => data.len() as u64,
      Self::Text(text) => text.len() as u64,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn bytes(&self) -> &[u8] {
    match self {
      Self::File { data, .. } => data,
      Self::Text(text) => text.as_bytes(),
    }
  }

  fn into_part(self) -> Result<Part, reqwest::Error> {
    match self {
      Self::File { name, data } => {
        let mime = mime_guess::from_path(&name).first_or_octet_stream();
        Part::bytes(data).file_name(name).mime_str(mime.as_ref())
      }
      Self::Text(text) => Part::text(text).file_name("blob").mime_str("text/plain"),
    }
  }
}

#[derive(Deserialize)]
struct UploadResponse {
  url: Option<String>,
  error: Option<String>,
}

/// Client of the service that hosts uploaded content under a pinnable URL.
#[derive(Debug, Clone)]
pub struct Uploader {
  client: Client,
  endpoint: Url,
}

impl Uploader {
  pub fn new(endpoint: Url) -> Self {
    Self {
      client: Client::new(),
      endpoint,
    }
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// Uploads `upload` after checking it against `max_size`, returning the URL
  /// the service hosts it at.
  pub async fn upload(&self, upload: Upload, max_size: u32) -> Result<String, Error> {
    validate(Payload::Raw(upload.bytes()), upload.len(), max_size)?;

    let endpoint = self.endpoint.as_str();
    log::info!("Uploading {} bytes to {endpoint}", upload.len());

    let part = upload
      .into_part()
      .map_err(|e| NetworkError::from_reqwest(endpoint, e))?;

    let response = self
      .client
      .post(self.endpoint.clone())
      .multipart(Form::new().part("file", part))
      .send()
      .await
      .map_err(|e| NetworkError::from_reqwest(endpoint, e))?;

    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| NetworkError::from_reqwest(endpoint, e))?;

    let parsed = serde_json::from_slice::<UploadResponse>(&body).ok();

    match parsed {
      Some(UploadResponse { url: Some(url), .. }) if status.is_success() => {
        log::info!("Uploaded to {url}");
        Ok(url)
      }
      Some(UploadResponse {
        error: Some(error), ..
      }) => Err(NetworkError::Upload(error).into()),
      _ if !status.is_success() => Err(
        NetworkError::Status {
          url: endpoint.to_string(),
          status: status.as_u16(),
        }
        .into(),
      ),
      _ => Err(NetworkError::Upload("response carries no url".into()).into()),
    }
  }
}
