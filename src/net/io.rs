//! JSON and RON encoding of [`NetDocument`]s.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{NetError, PetriNet};
use crate::net::document::NetDocument;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Net(#[from] NetError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Ron,
}

impl Format {
    /// `.ron` files are RON, everything else JSON.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Format::Ron,
            _ => Format::Json,
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<String, IoError> {
        match self {
            Format::Json => to_json_string(value),
            Format::Ron => to_ron_string(value),
        }
    }

    pub fn decode<T: DeserializeOwned>(self, s: &str) -> Result<T, IoError> {
        match self {
            Format::Json => from_json_str(s),
            Format::Ron => from_ron_str(s),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "ron" => Ok(Format::Ron),
            other => Err(format!("unknown format {other}")),
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn encode_net(net: &PetriNet, format: Format) -> Result<String, IoError> {
    format.encode(&NetDocument::from(net))
}

pub fn decode_net(s: &str, format: Format) -> Result<PetriNet, IoError> {
    let document: NetDocument = format.decode(s)?;
    Ok(PetriNet::try_from(document)?)
}

pub fn write_net<P: AsRef<Path>>(path: P, net: &PetriNet) -> Result<(), IoError> {
    let path = path.as_ref();
    let content = encode_net(net, Format::from_path(path))?;
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_net<P: AsRef<Path>>(path: P) -> Result<PetriNet, IoError> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    decode_net(&content, Format::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_JSON: &str = r#"{
        "tokens": [{ "id": "Default", "color": [0, 0, 0] }],
        "places": [
            { "id": "P0", "name": "P0", "marking": { "Default": 2 } },
            { "id": "P1", "name": "P1", "capacity": 5 }
        ],
        "transitions": [{ "id": "T0", "name": "T0" }],
        "arcs": [
            { "id": "P0 TO T0", "source": "P0", "target": "T0", "weights": { "Default": "1" } },
            { "id": "T0 TO P1", "source": "T0", "target": "P1", "weights": { "Default": "1" } }
        ]
    }"#;

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path("net.ron"), Format::Ron);
        assert_eq!(Format::from_path("net.RON"), Format::Ron);
        assert_eq!(Format::from_path("net.json"), Format::Json);
        assert_eq!(Format::from_path("net"), Format::Json);
        assert_eq!("ron".parse::<Format>(), Ok(Format::Ron));
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn decodes_sparse_json_with_defaults() {
        let net = decode_net(NET_JSON, Format::Json).unwrap();
        assert_eq!(net.place("P0").unwrap().token_count("Default"), 2);
        assert_eq!(net.place("P1").unwrap().capacity(), 5);
        assert_eq!(net.transition("T0").unwrap().priority, 1);
        assert_eq!(net.arcs_len(), 2);
    }

    #[test]
    fn ron_and_json_encode_the_same_net() {
        let net = decode_net(NET_JSON, Format::Json).unwrap();
        let ron = encode_net(&net, Format::Ron).unwrap();
        let json = encode_net(&net, Format::Json).unwrap();
        assert_eq!(decode_net(&ron, Format::Ron).unwrap(), net);
        assert_eq!(decode_net(&json, Format::Json).unwrap(), net);
    }

    #[test]
    fn malformed_input_is_reported() {
        assert!(matches!(
            decode_net("{", Format::Json),
            Err(IoError::Json(_))
        ));
        assert!(matches!(
            decode_net("(", Format::Ron),
            Err(IoError::RonParse(_))
        ));
        let dangling = NET_JSON.replace(r#""source": "P0""#, r#""source": "P9""#);
        assert!(matches!(
            decode_net(&dangling, Format::Json),
            Err(IoError::Net(NetError::InvalidArc(_)))
        ));
    }
}
