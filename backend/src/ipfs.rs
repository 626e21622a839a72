//! Pinning-service client used to publish NFT images and metadata.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum IpfsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Pinning service returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Clone)]
pub struct IpfsClient {
    http: reqwest::Client,
    api_url: String,
    jwt: String,
    gateway_url: String,
}

impl IpfsClient {
    pub fn new(api_url: &str, jwt: &str, gateway_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            jwt: jwt.to_string(),
            gateway_url: gateway_url.to_string(),
        }
    }

    /// Pins the image, then a metadata document pointing at it. Returns
    /// `(image_uri, metadata_uri)`.
    pub async fn upload_nft_metadata(
        &self,
        name: &str,
        description: &str,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<(String, String), IpfsError> {
        let image_hash = self.pin_file(file_name, image).await?;
        let image_uri = gateway_uri(&self.gateway_url, &image_hash);

        let metadata = metadata_document(name, description, &image_uri);
        let metadata_hash = self.pin_json(name, metadata).await?;
        let metadata_uri = gateway_uri(&self.gateway_url, &metadata_hash);

        log::info!("Pinned metadata for {} at {}", name, metadata_uri);
        Ok((image_uri, metadata_uri))
    }

    async fn pin_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, IpfsError> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;
        Self::read_hash(response).await
    }

    async fn pin_json(&self, name: &str, content: Value) -> Result<String, IpfsError> {
        let body = json!({
            "pinataContent": content,
            "pinataMetadata": { "name": name },
        });
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await?;
        Self::read_hash(response).await
    }

    async fn read_hash(response: reqwest::Response) -> Result<String, IpfsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IpfsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<PinResponse>().await?.ipfs_hash)
    }
}

pub fn gateway_uri(gateway_url: &str, hash: &str) -> String {
    format!("{}/{}", gateway_url.trim_end_matches('/'), hash)
}

/// Token metadata in the shape wallets and marketplaces read.
pub fn metadata_document(name: &str, description: &str, image_uri: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "image": image_uri,
        "properties": {
            "files": [{ "uri": image_uri }],
            "category": "image",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_uri_joins_without_double_slash() {
        assert_eq!(
            gateway_uri("https://gateway.pinata.cloud/ipfs/", "QmHash"),
            "https://gateway.pinata.cloud/ipfs/QmHash"
        );
        assert_eq!(gateway_uri("https://gw/ipfs", "QmHash"), "https://gw/ipfs/QmHash");
    }

    #[test]
    fn metadata_points_at_image() {
        let doc = metadata_document("Genesis", "first drop", "https://gw/ipfs/QmImg");
        assert_eq!(doc["name"], "Genesis");
        assert_eq!(doc["image"], "https://gw/ipfs/QmImg");
        assert_eq!(doc["properties"]["files"][0]["uri"], "https://gw/ipfs/QmImg");
    }

    #[test]
    fn pin_response_reads_hash() {
        let parsed: PinResponse =
            serde_json::from_str(r#"{"IpfsHash":"QmAbc","PinSize":12,"Timestamp":"now"}"#).unwrap();
        assert_eq!(parsed.ipfs_hash, "QmAbc");
    }
}
