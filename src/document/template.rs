use crate::pipeline::orchestrator::IcfSections;
use crate::pipeline::retrieval::NOT_PROVIDED;

/// Paragraph indices of the writable slots in the template.
const INDEX_PURPOSE_PARAGRAPH: usize = 8;
const INDEX_PROCEDURE_PARAGRAPH: usize = 10;
const INDEX_DURATION_PARAGRAPH: usize = 12;
const INDEX_RISK_PARAGRAPH: usize = 15;
const INDEX_BENEFIT_PARAGRAPH: usize = 17;

/// The fixed ICF layout. Writable slots ship as placeholder paragraphs and
/// are replaced by index; everything else is boilerplate the form keeps.
const TEMPLATE_PARAGRAPHS: &[&str] = &[
    "# Informed Consent Form",
    "Study Title:",
    "Protocol Number:",
    "Principal Investigator:",
    "Sponsor:",
    "You are being asked to take part in a research study. Take your time to decide; \
discuss it with your family, friends, and your own doctor.",
    "This form may contain words you do not understand. Please ask the study staff to \
explain anything that is not clear to you.",
    "## Why is this study being done?",
    NOT_PROVIDED,
    "## What will happen during this study?",
    NOT_PROVIDED,
    "## How long will I be in the study?",
    NOT_PROVIDED,
    "Your participation is voluntary. You may stop taking part at any time without \
penalty or loss of benefits you would otherwise receive.",
    "## What risks can I expect from being in the study?",
    NOT_PROVIDED,
    "## Are there benefits to taking part in the study?",
    NOT_PROVIDED,
    "## Signatures",
    "Participant signature: ______________________  Date: __________",
    "Investigator signature: ______________________  Date: __________",
];

// Slot indices must stay in sync with the template above.
const _: () = assert!(INDEX_BENEFIT_PARAGRAPH < TEMPLATE_PARAGRAPHS.len());

/// Fixed-layout ICF writer.
///
/// Writes each section string into its fixed paragraph slot and serializes
/// the whole form. A pure substitution operation; no retrieval logic.
pub struct IcfDocument {
    paragraphs: Vec<String>,
}

impl IcfDocument {
    /// Populate the template from retrieved section texts. The duration
    /// slot has no retrieval query and keeps its default.
    pub fn new(sections: &IcfSections) -> Self {
        let mut doc = Self::empty();
        doc.write_purpose(&sections.purpose.content);
        doc.write_procedures(&sections.procedure.content);
        doc.write_risks(&sections.risks.content);
        doc.write_benefits(&sections.benefits.content);
        doc
    }

    /// The unpopulated template, every slot at its default.
    pub fn empty() -> Self {
        Self {
            paragraphs: TEMPLATE_PARAGRAPHS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn write_purpose(&mut self, content: &str) {
        self.write_paragraph(INDEX_PURPOSE_PARAGRAPH, content);
    }

    pub fn write_procedures(&mut self, content: &str) {
        self.write_paragraph(INDEX_PROCEDURE_PARAGRAPH, content);
    }

    pub fn write_time_duration(&mut self, content: &str) {
        self.write_paragraph(INDEX_DURATION_PARAGRAPH, content);
    }

    pub fn write_risks(&mut self, content: &str) {
        self.write_paragraph(INDEX_RISK_PARAGRAPH, content);
    }

    pub fn write_benefits(&mut self, content: &str) {
        self.write_paragraph(INDEX_BENEFIT_PARAGRAPH, content);
    }

    fn write_paragraph(&mut self, index: usize, content: &str) {
        self.paragraphs[index] = content.to_string();
    }

    /// Serialize the form as Markdown bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.paragraphs.join("\n\n").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::retrieval::{Section, SectionText};

    fn sections() -> IcfSections {
        let text = |section, content: &str| SectionText {
            section,
            content: content.to_string(),
        };
        IcfSections {
            purpose: text(Section::Purpose, "Evaluate the study drug."),
            procedure: text(Section::Procedure, "Monthly clinic visits."),
            risks: text(Section::Risks, "Nausea and fatigue."),
            benefits: text(Section::Benefits, "Possible tumor reduction."),
        }
    }

    #[test]
    fn sections_land_in_their_slots() {
        let doc = IcfDocument::new(&sections());
        assert_eq!(doc.paragraphs[INDEX_PURPOSE_PARAGRAPH], "Evaluate the study drug.");
        assert_eq!(doc.paragraphs[INDEX_PROCEDURE_PARAGRAPH], "Monthly clinic visits.");
        assert_eq!(doc.paragraphs[INDEX_RISK_PARAGRAPH], "Nausea and fatigue.");
        assert_eq!(doc.paragraphs[INDEX_BENEFIT_PARAGRAPH], "Possible tumor reduction.");
    }

    #[test]
    fn duration_slot_keeps_default() {
        let doc = IcfDocument::new(&sections());
        assert_eq!(doc.paragraphs[INDEX_DURATION_PARAGRAPH], NOT_PROVIDED);
    }

    #[test]
    fn duration_is_writable_separately() {
        let mut doc = IcfDocument::new(&sections());
        doc.write_time_duration("About 12 months.");
        assert_eq!(doc.paragraphs[INDEX_DURATION_PARAGRAPH], "About 12 months.");
    }

    #[test]
    fn serialized_form_contains_headings_and_content() {
        let bytes = IcfDocument::new(&sections()).to_bytes();
        let markdown = String::from_utf8(bytes).unwrap();

        assert!(markdown.starts_with("# Informed Consent Form"));
        assert!(markdown.contains("## Why is this study being done?"));
        assert!(markdown.contains("Nausea and fatigue."));
        assert!(markdown.contains("## Signatures"));
    }

    #[test]
    fn empty_template_defaults_every_slot() {
        let markdown = String::from_utf8(IcfDocument::empty().to_bytes()).unwrap();
        assert_eq!(markdown.matches(NOT_PROVIDED).count(), 5);
    }

    #[test]
    fn boilerplate_is_untouched_by_population() {
        let populated = IcfDocument::new(&sections());
        let empty = IcfDocument::empty();

        for (i, (a, b)) in populated.paragraphs.iter().zip(empty.paragraphs.iter()).enumerate() {
            let is_slot = matches!(
                i,
                INDEX_PURPOSE_PARAGRAPH
                    | INDEX_PROCEDURE_PARAGRAPH
                    | INDEX_RISK_PARAGRAPH
                    | INDEX_BENEFIT_PARAGRAPH
            );
            if !is_slot {
                assert_eq!(a, b, "paragraph {i} changed unexpectedly");
            }
        }
    }
}
