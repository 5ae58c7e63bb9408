//! Static copy for the demo landing page

pub const TAGLINE: &str = "Sections that wake up when you reach them";

pub const HERO_LINES: &[&str] = &[
    "Scroll down. Nothing below this fold does any work until it is on screen.",
    "Counters start when their section appears, heavy sections build on first sight,",
    "and the nav bar follows your position.",
];

/// Label, target value and suffix of each statistic
pub const STATS: &[(&str, f64, &str)] = &[
    ("Readers", 12840.0, ""),
    ("Feeds tracked", 342.0, ""),
    ("Uptime", 99.0, "%"),
];

pub const TESTIMONIALS: &[(&str, &str)] = &[
    ("Ana, platform lead", "We stopped paying for work nobody scrolled to."),
    ("Bo, frontend engineer", "The counters finally start where people can see them."),
    ("Chidi, designer", "Reveals feel deliberate instead of all at once."),
    ("Dana, SRE", "Teardown is boring. That is the highest compliment I have."),
];

pub const FAQ: &[(&str, &str)] = &[
    (
        "Does a counter restart when I scroll back?",
        "No. Once it has finished it stays put until reset.",
    ),
    (
        "What if the host cannot observe visibility?",
        "Everything stays in its initial state and nothing fails.",
    ),
    ("Are deferred sections unloaded off screen?", "No. Once built they stay built."),
    ("How often does the nav bar update?", "At most once per frame interval."),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub name: String,
    pub price: String,
    pub perks: Vec<String>,
}

/// Build the feature grid (deferred until its section is seen)
pub fn build_features() -> Vec<Feature> {
    [
        ("Visibility observers", "Threshold and margin aware, with trigger-once freezing."),
        ("Scroll tracking", "Offset, direction, threshold and progress, rate limited."),
        ("Count-up animation", "Frame driven with easing, delay and exact final values."),
        ("Deferred sections", "Build heavy content once, the first time it is seen."),
        ("Timing marks", "Start and end marks per section for render profiling."),
    ]
    .into_iter()
    .map(|(title, body)| Feature {
        title: title.to_string(),
        body: body.to_string(),
    })
    .collect()
}

/// Build the pricing table (deferred until its section is seen)
pub fn build_plans() -> Vec<Plan> {
    [
        ("Hobby", "$0", &["1 site", "Community support"][..]),
        ("Team", "$19", &["10 sites", "Email support", "Section timings"][..]),
        ("Scale", "$79", &["Unlimited sites", "Priority support", "Audit log"][..]),
    ]
    .into_iter()
    .map(|(name, price, perks)| Plan {
        name: name.to_string(),
        price: price.to_string(),
        perks: perks.iter().map(|p| p.to_string()).collect(),
    })
    .collect()
}
