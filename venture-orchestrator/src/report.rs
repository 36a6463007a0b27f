//! Report rendering
//!
//! Pure transform from a dossier to the `report.md` artifact. Sections the
//! run never produced are simply omitted.

use std::fmt::Write;

use venture_core::domain::dossier::{Dossier, Recommendation};

/// Renders the markdown report for a dossier
pub fn render_markdown(dossier: &Dossier) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Startup Analysis Dossier");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Idea**: {}", dossier.idea);
    let _ = writeln!(out, "**Run**: `{}`", dossier.run_id);
    let _ = writeln!(out, "**Created**: {}", dossier.created_at.to_rfc3339());
    let _ = writeln!(out);

    if let Some(clarified) = &dossier.clarified_idea {
        let _ = writeln!(out, "## Clarified Idea");
        let _ = writeln!(out);
        let _ = writeln!(out, "- **Problem**: {}", clarified.problem);
        let _ = writeln!(out, "- **Solution**: {}", clarified.solution);
        let _ = writeln!(out, "- **Target customer**: {}", clarified.target_customer);
        let _ = writeln!(out, "- **Value proposition**: {}", clarified.value_proposition);
        if !clarified.assumptions.is_empty() {
            let _ = writeln!(out, "- **Assumptions**:");
            for assumption in &clarified.assumptions {
                let _ = writeln!(out, "  - {}", assumption);
            }
        }
        let _ = writeln!(out);
    }

    if let Some(market) = &dossier.market_research {
        let _ = writeln!(out, "## Market Research");
        let _ = writeln!(out);
        for competitor in &market.competitors {
            let _ = writeln!(out, "### {}", competitor.name);
            let _ = writeln!(out, "{}", competitor.description);
            if let Some(pricing) = &competitor.pricing {
                let _ = writeln!(out, "Pricing: {}", pricing);
            }
            let _ = writeln!(out);
        }
        if !market.trends.is_empty() {
            let _ = writeln!(out, "**Trends**:");
            for trend in &market.trends {
                let _ = writeln!(out, "- {}", trend);
            }
            let _ = writeln!(out);
        }
        if !market.citations.is_empty() {
            let _ = writeln!(out, "**Sources**:");
            for citation in &market.citations {
                let _ = writeln!(out, "- [{}]({})", citation.title, citation.url);
            }
            let _ = writeln!(out);
        }
    }

    if let Some(positioning) = &dossier.positioning {
        let _ = writeln!(out, "## Positioning");
        let _ = writeln!(out);
        let _ = writeln!(out, "> {}", positioning.positioning_statement);
        let _ = writeln!(out);
        let _ = writeln!(out, "- **ICP**: {}", positioning.icp);
        let _ = writeln!(out, "- **Unique value**: {}", positioning.unique_value);
        for differentiator in &positioning.differentiators {
            let _ = writeln!(out, "- {}", differentiator);
        }
        let _ = writeln!(out);
    }

    if let Some(mvp) = &dossier.mvp_plan {
        let _ = writeln!(out, "## MVP Plan");
        let _ = writeln!(out);
        for feature in &mvp.features {
            let _ = writeln!(
                out,
                "- **{}** ({} / {}): {}",
                feature.name, feature.priority, feature.effort, feature.description
            );
        }
        let _ = writeln!(out);
        for milestone in &mvp.roadmap {
            let _ = writeln!(out, "- Week {}: {}", milestone.week, milestone.goal);
        }
        let _ = writeln!(out);
    }

    if let Some(debate) = &dossier.debate {
        let _ = writeln!(out, "## Investor Debate");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", debate.synthesis);
        let _ = writeln!(out);
        if !debate.key_risks.is_empty() {
            let _ = writeln!(out, "**Key risks**:");
            for risk in &debate.key_risks {
                let _ = writeln!(out, "- {}", risk);
            }
            let _ = writeln!(out);
        }
    }

    if let Some(finance) = &dossier.finance {
        let _ = writeln!(out, "## Financial Model");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "| LTV:CAC | Payback (months) | Gross margin | Break-even customers |"
        );
        let _ = writeln!(out, "|---|---|---|---|");
        let _ = writeln!(
            out,
            "| {:.2} | {:.1} | {:.0}% | {} |",
            finance.outputs.ltv_cac_ratio,
            finance.outputs.payback_months,
            finance.outputs.gross_margin * 100.0,
            finance.outputs.break_even_customers
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", finance.sensitivity_notes);
        let _ = writeln!(out);
    }

    if let Some(confidence) = &dossier.confidence_score {
        let _ = writeln!(out, "## Confidence");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Overall confidence: {:.0}%. {}",
            confidence.overall_confidence * 100.0,
            confidence.reasoning
        );
        let _ = writeln!(out);
    }

    if let Some(scan) = &dossier.media_scan {
        if !scan.videos.is_empty() {
            let _ = writeln!(out, "## Competitor Media");
            let _ = writeln!(out);
            for video in &scan.videos {
                let _ = writeln!(out, "- [{}]({}): {}", video.title, video.url, video.summary);
            }
            let _ = writeln!(out);
        }
    }

    if let Some(report) = &dossier.final_report {
        let _ = writeln!(out, "## Verdict");
        let _ = writeln!(out);
        let verdict = match report.recommendation {
            Recommendation::Go => "GO",
            Recommendation::NoGo => "NO-GO",
            Recommendation::Pivot => "PIVOT",
        };
        let _ = writeln!(
            out,
            "**{}** (overall score {:.1}/10)",
            verdict, report.scorecard.overall_score
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", report.scorecard.reasoning);
        let _ = writeln!(out);
        for insight in &report.key_insights {
            let _ = writeln!(out, "- {}", insight);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", report.go_to_market_summary);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use venture_core::domain::dossier::{ClarifiedIdea, Dossier};

    #[test]
    fn test_render_includes_idea_and_present_sections_only() {
        let mut dossier = Dossier::new(Uuid::new_v4(), "AI meal planner".to_string());
        dossier.clarified_idea = Some(ClarifiedIdea {
            problem: "meal planning is tedious".into(),
            solution: "automated weekly plans".into(),
            target_customer: "busy parents".into(),
            value_proposition: "save two hours a week".into(),
            assumptions: vec![],
        });

        let report = render_markdown(&dossier);
        assert!(report.contains("AI meal planner"));
        assert!(report.contains("## Clarified Idea"));
        assert!(report.contains("busy parents"));
        assert!(!report.contains("## Market Research"));
        assert!(!report.contains("## Verdict"));
    }

    #[test]
    fn test_render_is_pure() {
        let dossier = Dossier::new(Uuid::new_v4(), "idea".to_string());
        assert_eq!(render_markdown(&dossier), render_markdown(&dossier));
    }
}
