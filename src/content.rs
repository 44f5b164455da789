use rand::Rng;

/// One video idea: the upload title plus the narration script read over the
/// stock footage. Chosen once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    pub narration: String,
}

pub const TOPIC_CANDIDATES: &[(&str, &str)] = &[
    (
        "AI Side Hustles Nobody Talks About",
        "Everyone knows about chatbots, but the real money is in the AI hustles \
         nobody talks about. Today we break down three under-the-radar ways \
         people are quietly earning with free AI tools, and how you can start \
         the same thing this week with zero investment.",
    ),
    (
        "How to Make $500/Day with Free AI Tools",
        "Five hundred dollars a day sounds wild, but the playbook is simpler \
         than you think. Free AI tools can write, design, and automate for you \
         while you sleep. Here is the exact stack people are using right now \
         and how to put it to work today.",
    ),
    (
        "Unique AI Business Ideas for 2025",
        "2025 is the year AI businesses go from novelty to normal. In this \
         video we cover unique AI business ideas that are still wide open, \
         from niche automation services to AI-generated content brands, and \
         why the window to start is right now.",
    ),
    (
        "Hidden AI Hustles That Actually Pay",
        "Most AI hustle advice is recycled. These hidden hustles are the ones \
         that actually pay, because almost nobody is doing them yet. We walk \
         through each one, what it earns, and the free tools that make it \
         possible with no upfront cost.",
    ),
    (
        "Earn Passive Income with AI (Zero Cost)",
        "Passive income with AI does not require a budget, just the right \
         system. Today we show how to set up an AI pipeline that produces and \
         publishes for you on autopilot, turning a few hours of setup into an \
         income stream that runs itself.",
    ),
];

pub fn pick_topic<R: Rng>(rng: &mut R) -> Topic {
    let (title, narration) = TOPIC_CANDIDATES[rng.gen_range(0..TOPIC_CANDIDATES.len())];
    Topic {
        title: title.to_string(),
        narration: narration.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn picked_topic_is_a_candidate() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let topic = pick_topic(&mut rng);
            assert!(!topic.title.is_empty());
            assert!(!topic.narration.is_empty());
            assert!(
                TOPIC_CANDIDATES
                    .iter()
                    .any(|(t, n)| *t == topic.title && *n == topic.narration),
                "topic not in candidate set: {}",
                topic.title
            );
        }
    }

    #[test]
    fn all_candidates_reachable() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1234);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(pick_topic(&mut rng).title);
        }
        assert_eq!(seen.len(), TOPIC_CANDIDATES.len());
    }
}
