//! Context snapshot and patch types
//!
//! The context snapshot is the cumulative, partially-populated record of
//! generation progress shared between the generation step and the client.
//! Patches are cumulative: each one refines the fields it carries and never
//! rolls a field back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An artifact the generation step has saved for citation, keyed by topic in
/// the snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedArtifact {
    pub artifact_id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    /// Full parsed text; omitted in lighter-weight patches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_text: Option<String>,
}

/// A research topic planned by the generation step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchTopic {
    pub research_question: String,
    pub related_key_concepts: String,
    pub related_user_requirements: String,
}

/// One outline/document section of the runbook under construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunbookSection {
    pub section_title: String,
    pub outline: String,
    /// Artifact ids grounding this section
    #[serde(default)]
    pub related_artifacts: Vec<String>,
    /// Written prose; absent until the section-writing pass reaches it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// The fully-materialized context snapshot held by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextSnapshot {
    pub domain_id: Option<String>,
    pub user_requirements: Vec<String>,
    pub research_topics: Vec<ResearchTopic>,
    pub current_research_topic: Option<usize>,
    /// Saved artifacts keyed by research topic
    pub saved_artifacts: BTreeMap<String, Vec<SavedArtifact>>,
    pub runbook_sections: Vec<RunbookSection>,
    pub current_runbook_section: Option<usize>,
    /// Artifacts re-retrieved for a section during writing, keyed by section
    /// index
    pub section_research_artifacts: BTreeMap<usize, Vec<SavedArtifact>>,
}

/// A partial context snapshot carried by one `context_delta` event
///
/// Every field is optional: a field that is present replaces the prior value
/// wholesale, a field that is absent leaves the prior value untouched. A patch
/// missing expected fields is not an error; those fields are simply not
/// merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_topics: Option<Vec<ResearchTopic>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_research_topic: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_artifacts: Option<BTreeMap<String, Vec<SavedArtifact>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook_sections: Option<Vec<RunbookSection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_runbook_section: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_research_artifacts: Option<BTreeMap<usize, Vec<SavedArtifact>>>,
}

impl ContextSnapshot {
    /// Merge a patch into this snapshot, field by field
    pub fn merge(&mut self, patch: ContextPatch) {
        if let Some(domain_id) = patch.domain_id {
            self.domain_id = Some(domain_id);
        }
        if let Some(user_requirements) = patch.user_requirements {
            self.user_requirements = user_requirements;
        }
        if let Some(research_topics) = patch.research_topics {
            self.research_topics = research_topics;
        }
        if let Some(current_research_topic) = patch.current_research_topic {
            self.current_research_topic = Some(current_research_topic);
        }
        if let Some(saved_artifacts) = patch.saved_artifacts {
            self.saved_artifacts = saved_artifacts;
        }
        if let Some(runbook_sections) = patch.runbook_sections {
            self.runbook_sections = runbook_sections;
        }
        if let Some(current_runbook_section) = patch.current_runbook_section {
            self.current_runbook_section = Some(current_runbook_section);
        }
        if let Some(section_research_artifacts) = patch.section_research_artifacts {
            self.section_research_artifacts = section_research_artifacts;
        }
    }

    /// Concatenated per-section content, the document view's change signal
    pub fn sections_content(&self) -> String {
        self.runbook_sections
            .iter()
            .filter_map(|section| section.content.as_deref())
            .collect()
    }
}

/// Concatenated content across a patch's sections, if the patch carries any
pub fn patch_sections_content(sections: &[RunbookSection]) -> String {
    sections
        .iter()
        .filter_map(|section| section.content.as_deref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, content: Option<&str>) -> RunbookSection {
        RunbookSection {
            section_title: title.into(),
            outline: format!("Outline for {}", title),
            related_artifacts: vec![],
            content: content.map(Into::into),
        }
    }

    #[test]
    fn test_merge_replaces_present_fields_wholesale() {
        let mut snapshot = ContextSnapshot {
            user_requirements: vec!["old requirement".into()],
            ..ContextSnapshot::default()
        };

        snapshot.merge(ContextPatch {
            user_requirements: Some(vec!["new requirement".into()]),
            ..ContextPatch::default()
        });

        assert_eq!(snapshot.user_requirements, vec!["new requirement"]);
    }

    #[test]
    fn test_merge_leaves_absent_fields_untouched() {
        let mut snapshot = ContextSnapshot {
            domain_id: Some("prod-docs".into()),
            runbook_sections: vec![section("Overview", Some("text"))],
            ..ContextSnapshot::default()
        };

        snapshot.merge(ContextPatch {
            current_runbook_section: Some(0),
            ..ContextPatch::default()
        });

        assert_eq!(snapshot.domain_id.as_deref(), Some("prod-docs"));
        assert_eq!(snapshot.runbook_sections.len(), 1);
        assert_eq!(snapshot.current_runbook_section, Some(0));
    }

    #[test]
    fn test_sections_content_skips_unwritten_sections() {
        let snapshot = ContextSnapshot {
            runbook_sections: vec![
                section("One", Some("first")),
                section("Two", None),
                section("Three", Some("third")),
            ],
            ..ContextSnapshot::default()
        };
        assert_eq!(snapshot.sections_content(), "firstthird");
    }

    #[test]
    fn test_section_research_artifacts_merge_from_wire_patch() {
        let mut snapshot = ContextSnapshot::default();

        let patch: ContextPatch = serde_json::from_value(serde_json::json!({
            "section_research_artifacts": {
                "1": [{
                    "artifact_id": "art-7",
                    "url": "https://docs.example.com/art-7",
                    "title": "Ingress TLS",
                    "summary": "TLS termination at the ingress",
                }]
            }
        }))
        .unwrap();
        snapshot.merge(patch);

        let artifacts = &snapshot.section_research_artifacts[&1];
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].artifact_id, "art-7");
    }

    #[test]
    fn test_patch_round_trips_without_absent_fields() {
        let patch = ContextPatch {
            current_runbook_section: Some(2),
            ..ContextPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"current_runbook_section": 2}));

        let parsed: ContextPatch = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, patch);
    }
}
