/// Title, description and tags submitted with the upload. Derived from the
/// chosen topic by pure templating; never touches the network or disk.
#[derive(Debug, Clone)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

const FIXED_TAGS: &[&str] = &[
    "AI Hustle",
    "Make Money Online",
    "AI Tools",
    "Passive Income",
    "Side Hustle 2025",
];

pub fn build_metadata(title: &str) -> SeoMetadata {
    let description = format!(
        "{}\n\n\
         Discover the latest AI hustle you can start today with zero investment. \
         Daily uploads about AI tools, automation and hidden income streams.\n\n\
         #AI #SideHustle #MakeMoneyOnline",
        title
    );

    SeoMetadata {
        title: title.to_string(),
        description,
        tags: FIXED_TAGS.iter().map(|t| t.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_embeds_exact_title() {
        let title = "Hidden AI Hustles That Actually Pay";
        let meta = build_metadata(title);
        assert_eq!(meta.title, title);
        assert!(meta.description.contains(title));
        assert!(meta.description.contains("#AI"));
    }

    #[test]
    fn tags_are_non_empty() {
        let meta = build_metadata("Any Title");
        assert!(!meta.tags.is_empty());
        assert!(meta.tags.iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn same_title_same_output() {
        let a = build_metadata("Earn Passive Income with AI (Zero Cost)");
        let b = build_metadata("Earn Passive Income with AI (Zero Cost)");
        assert_eq!(a.description, b.description);
        assert_eq!(a.tags, b.tags);
    }
}
