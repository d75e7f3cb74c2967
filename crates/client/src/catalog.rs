//! Remote catalog search

use labpull_common::{CatalogSection, Error, Result};

use crate::http::PanelApi;

/// Fetch the installable-image catalog, optionally narrowed server-side
pub async fn search(api: &dyn PanelApi, query: Option<&str>) -> Result<Vec<CatalogSection>> {
    let reply = api.search_all(query).await?;

    if !reply.success {
        let message = reply
            .message
            .or(reply.stderr)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "catalog search failed".to_string());
        return Err(Error::Rejected(message));
    }

    Ok(reply.sections)
}

/// Case-insensitive client-side filter on item names. Sections whose items
/// all fall out are dropped entirely.
pub fn filter_sections(sections: &[CatalogSection], term: &str) -> Vec<CatalogSection> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return sections.to_vec();
    }

    sections
        .iter()
        .filter_map(|section| {
            let items: Vec<_> = section
                .items
                .iter()
                .filter(|item| item.name.to_lowercase().contains(&term))
                .cloned()
                .collect();

            if items.is_empty() {
                None
            } else {
                Some(CatalogSection {
                    kind: section.kind.clone(),
                    label: section.label.clone(),
                    items,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labpull_common::CatalogItem;

    fn sections() -> Vec<CatalogSection> {
        vec![
            CatalogSection {
                kind: "qemu".to_string(),
                label: "QEMU".to_string(),
                items: vec![
                    CatalogItem {
                        id: 1,
                        name: "vios-adventerprisek9".to_string(),
                        size: "128M".to_string(),
                    },
                    CatalogItem {
                        id: 2,
                        name: "csr1000vng".to_string(),
                        size: "1.2G".to_string(),
                    },
                ],
            },
            CatalogSection {
                kind: "iol".to_string(),
                label: "IOL".to_string(),
                items: vec![CatalogItem {
                    id: 7,
                    name: "i86bi-linux-l2".to_string(),
                    size: "90M".to_string(),
                }],
            },
        ]
    }

    #[test]
    fn test_empty_term_keeps_everything() {
        let all = filter_sections(&sections(), "  ");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].items.len(), 2);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let hits = filter_sections(&sections(), "VIOS");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].items.len(), 1);
        assert_eq!(hits[0].items[0].id, 1);
    }

    #[test]
    fn test_emptied_sections_are_dropped() {
        let hits = filter_sections(&sections(), "csr");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, "qemu");
    }

    #[test]
    fn test_no_match_yields_empty() {
        assert!(filter_sections(&sections(), "junos").is_empty());
    }
}
