use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MembershipError;
use crate::plans::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Document,
    Image,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Video, ContentKind::Document, ContentKind::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Document => "document",
            ContentKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(ContentKind::Video),
            "document" => Some(ContentKind::Document),
            "image" => Some(ContentKind::Image),
            _ => None,
        }
    }
}

/// One gated item in the media library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub required_plan: Plan,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_content(
        &self,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ContentItem>, MembershipError>;
}

/// Starter catalog, loaded once into an empty content table.
pub fn demo_catalog() -> Vec<ContentItem> {
    fn item(
        id: &str,
        kind: ContentKind,
        title: &str,
        description: &str,
        required_plan: Plan,
    ) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            description: description.to_string(),
            url: format!("https://cdn.example.com/{}/{}", kind.as_str(), id),
            thumbnail: Some(format!("https://cdn.example.com/thumbs/{id}.jpg")),
            required_plan,
        }
    }

    vec![
        item(
            "v-welcome",
            ContentKind::Video,
            "Welcome Tour",
            "Getting started with your membership",
            Plan::Basic,
        ),
        item(
            "v-foundations",
            ContentKind::Video,
            "Foundations Course",
            "The complete beginner series",
            Plan::Basic,
        ),
        item(
            "v-masterclass",
            ContentKind::Video,
            "Masterclass",
            "Deep-dive sessions for advanced members",
            Plan::Premium,
        ),
        item(
            "v-backstage",
            ContentKind::Video,
            "Backstage",
            "Unreleased footage and Q&A recordings",
            Plan::Elite,
        ),
        item(
            "d-handbook",
            ContentKind::Document,
            "Member Handbook",
            "Everything in one PDF",
            Plan::Basic,
        ),
        item(
            "d-worksheets",
            ContentKind::Document,
            "Worksheets",
            "Printable exercises for every module",
            Plan::Premium,
        ),
        item(
            "d-templates",
            ContentKind::Document,
            "Pro Templates",
            "Ready-to-use project templates",
            Plan::Premium,
        ),
        item(
            "d-playbook",
            ContentKind::Document,
            "Elite Playbook",
            "Strategies reserved for elite members",
            Plan::Elite,
        ),
        item(
            "i-gallery",
            ContentKind::Image,
            "Community Gallery",
            "Highlights from the community",
            Plan::Basic,
        ),
        item(
            "i-wallpapers",
            ContentKind::Image,
            "Wallpaper Pack",
            "High-resolution downloads",
            Plan::Premium,
        ),
        item(
            "i-prints",
            ContentKind::Image,
            "Print Collection",
            "Full-quality printable artwork",
            Plan::Elite,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in ContentKind::ALL {
            assert_eq!(ContentKind::parse(kind.as_str()), Some(kind));
        }
        assert!(ContentKind::parse("audio").is_none());
    }

    #[test]
    fn demo_catalog_covers_every_kind_and_tier() {
        let catalog = demo_catalog();
        for kind in ContentKind::ALL {
            assert!(catalog.iter().any(|c| c.kind == kind));
        }
        for plan in Plan::ALL {
            assert!(catalog.iter().any(|c| c.required_plan == plan));
        }
    }
}
