//! Entity kinds and where they live in the document

use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tme_document::DocPath;
use tme_integrity::schema::{
    COMMUNICATION_LINKS, DATA_ASSETS, SHARED_RUNTIMES, TECHNICAL_ASSETS, TRUST_BOUNDARIES,
};

/// Kind of entity addressed by an editor intent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    /// `technical_assets.<key>`
    TechnicalAsset,
    /// `data_assets.<key>`; the key may double as an anchor name
    DataAsset,
    /// `trust_boundaries.<key>`
    TrustBoundary,
    /// `shared_runtimes.<key>`
    SharedRuntime,
    /// `technical_assets.<owner>.communication_links.<key>`
    CommunicationLink {
        /// Key of the owning technical asset
        owner: String,
    },
    /// `communication_links.<key>`
    TopLevelCommunicationLink,
}

impl EntityKind {
    /// Path of the map holding entities of this kind
    #[must_use]
    pub fn collection_path(&self) -> DocPath {
        match self {
            Self::CommunicationLink { owner } => {
                DocPath::from([TECHNICAL_ASSETS]).key(owner.as_str()).key(COMMUNICATION_LINKS)
            }
            other => DocPath::from([other.section()]),
        }
    }

    /// Top-level section this kind lives under
    #[must_use]
    pub fn section(&self) -> &'static str {
        match self {
            Self::TechnicalAsset | Self::CommunicationLink { .. } => TECHNICAL_ASSETS,
            Self::DataAsset => DATA_ASSETS,
            Self::TrustBoundary => TRUST_BOUNDARIES,
            Self::SharedRuntime => SHARED_RUNTIMES,
            Self::TopLevelCommunicationLink => COMMUNICATION_LINKS,
        }
    }

    /// Path of one entity
    #[must_use]
    pub fn entity_path(&self, key: &str) -> DocPath {
        self.collection_path().key(key)
    }

    /// Check if the key of this kind is kept equal to an anchor name
    #[inline]
    #[must_use]
    pub fn is_anchor_target(&self) -> bool {
        matches!(self, Self::DataAsset)
    }

    /// Prefix and total length of issued ids; links carry no id
    #[must_use]
    pub fn id_format(&self) -> Option<(&'static str, usize)> {
        match self {
            Self::TechnicalAsset => Some(("ta-", 25)),
            Self::DataAsset => Some(("da-", 25)),
            Self::TrustBoundary => Some(("tr-", 25)),
            Self::SharedRuntime => Some(("sr-", 25)),
            Self::CommunicationLink { .. } | Self::TopLevelCommunicationLink => None,
        }
    }

    /// Prefix and total length of issued keys
    #[must_use]
    pub fn key_format(&self) -> (&'static str, usize) {
        match self {
            Self::TechnicalAsset => ("key-", 15),
            Self::DataAsset => ("DATA-", 10),
            Self::TrustBoundary => ("Trust-", 10),
            Self::SharedRuntime => ("Runtime-", 12),
            Self::CommunicationLink { .. } | Self::TopLevelCommunicationLink => ("Com-", 10),
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::TechnicalAsset => "technical asset",
            Self::DataAsset => "data asset",
            Self::TrustBoundary => "trust boundary",
            Self::SharedRuntime => "shared runtime",
            Self::CommunicationLink { .. } | Self::TopLevelCommunicationLink => {
                "communication link"
            }
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection_path())
    }
}

impl FromStr for EntityKind {
    type Err = EditError;

    /// Parse a collection path such as `data_assets` or
    /// `technical_assets.web.communication_links`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path: DocPath = s
            .parse()
            .map_err(|_| EditError::UnknownCollection(s.to_string()))?;
        let keys: Option<Vec<&str>> = path.iter().map(|segment| segment.as_key()).collect();
        match keys.as_deref() {
            Some([TECHNICAL_ASSETS]) => Ok(Self::TechnicalAsset),
            Some([DATA_ASSETS]) => Ok(Self::DataAsset),
            Some([TRUST_BOUNDARIES]) => Ok(Self::TrustBoundary),
            Some([SHARED_RUNTIMES]) => Ok(Self::SharedRuntime),
            Some([COMMUNICATION_LINKS]) => Ok(Self::TopLevelCommunicationLink),
            Some([TECHNICAL_ASSETS, owner, COMMUNICATION_LINKS]) => Ok(Self::CommunicationLink {
                owner: (*owner).to_string(),
            }),
            _ => Err(EditError::UnknownCollection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_collection_paths() {
        assert_eq!("data_assets".parse::<EntityKind>().unwrap(), EntityKind::DataAsset);
        assert_eq!(
            "technical_assets.web.communication_links".parse::<EntityKind>().unwrap(),
            EntityKind::CommunicationLink {
                owner: "web".to_string()
            }
        );
        assert_eq!(
            "communication_links".parse::<EntityKind>().unwrap(),
            EntityKind::TopLevelCommunicationLink
        );
        assert!(matches!(
            "risk_tracking".parse::<EntityKind>(),
            Err(EditError::UnknownCollection(_))
        ));
        assert!("technical_assets[0]".parse::<EntityKind>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let kind = EntityKind::CommunicationLink {
            owner: "web-server".to_string(),
        };
        assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
    }

    #[test]
    fn only_data_assets_follow_anchors() {
        assert!(EntityKind::DataAsset.is_anchor_target());
        assert!(!EntityKind::TechnicalAsset.is_anchor_target());
        assert_eq!(EntityKind::TopLevelCommunicationLink.id_format(), None);
    }

    #[test]
    fn entity_paths() {
        assert_eq!(
            EntityKind::TechnicalAsset.entity_path("web").to_string(),
            "technical_assets.web"
        );
    }
}
