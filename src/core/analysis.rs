//! Visualization artifacts and report text produced by the later stages.

use crate::domain::{AffectiveDataPoint, GraphData, GraphLink, GraphNode, QualitativeStrength};

/// Node every concept eventually flows into
pub const OUTPUT_NODE: &str = "final_output";

/// Node added when archetype projection is enabled
pub const ARCHETYPE_NODE: &str = "archetype_helpful";

/// Number of samples in the affective trajectory
pub const TRAJECTORY_LEN: usize = 5;

/// Concept graph for the Symbolic stage.
///
/// Seed nodes describe the request, its topic and the governance context,
/// all converging on the output sink.
pub fn coherence_graph(archetype_projection: bool) -> GraphData {
    let mut graph = GraphData {
        nodes: vec![
            GraphNode::new("prompt", "Prompt", "intent", 1.0),
            GraphNode::new("request", "Request", "concept", 0.8),
            GraphNode::new("topic", "Topic", "concept", 0.6),
            GraphNode::new("governance", "Governance", "concept", 0.9),
            GraphNode::new(OUTPUT_NODE, "Output", "output", 1.0),
        ],
        links: vec![
            GraphLink::new("prompt", "request"),
            GraphLink::new("prompt", "governance"),
            GraphLink::new("request", "topic"),
            GraphLink::new("request", OUTPUT_NODE),
            GraphLink::new("governance", OUTPUT_NODE),
        ],
    };

    if archetype_projection {
        graph
            .nodes
            .push(GraphNode::new(ARCHETYPE_NODE, "Helpful Assistant", "archetype", 1.2));
        graph.links.push(GraphLink::new(ARCHETYPE_NODE, OUTPUT_NODE));
    }

    graph
}

/// Affective trajectory for the Phenomenological stage, ordered by time
pub fn affective_trajectory() -> Vec<AffectiveDataPoint> {
    (0..TRAJECTORY_LEN)
        .map(|i| {
            let step = i as f64 / 10.0;
            AffectiveDataPoint {
                id: (i + 1).to_string(),
                time: (i + 1) as u32,
                valence: round2(0.5 + step),
                arousal: round2(0.5 - step),
                dominance: round2(0.5 + step),
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Natural-language summary for the introspection report
pub fn summarize(
    redacted: bool,
    rules_validated: usize,
    coherence: QualitativeStrength,
    congruence: QualitativeStrength,
) -> String {
    if redacted {
        return format!(
            "The request was blocked by the security screen before it could shape the output. \
             The redaction notice was still checked against {} structural rules, with '{}' \
             coherence and a '{}' affective target.",
            rules_validated, coherence, congruence
        );
    }

    format!(
        "The final output was generated by balancing the user's direct request with active \
         governance constraints, ensuring both helpfulness and safety. {} structural rules were \
         validated at '{}' coherence with a '{}' affective target.",
        rules_validated, coherence, congruence
    )
}
