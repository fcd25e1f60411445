use crate::news::Article;

/// Fixed articles used for previews
pub fn sample_articles() -> Vec<Article> {
    vec![
        Article::new(
            "San Francisco Tech Companies Announce Major AI Breakthrough",
            "Leading tech companies in the Bay Area have unveiled a new artificial intelligence system that promises to revolutionize how we interact with technology.",
            "https://example.com/ai-news",
        ),
        Article::new(
            "New Tech Hub Opens in Oakland",
            "A new technology innovation center has opened its doors in downtown Oakland, bringing hundreds of new jobs to the East Bay area.",
            "https://example.com/oakland-tech",
        ),
        Article::new(
            "Silicon Valley Startup Raises $50M in Series B Funding",
            "A promising startup focused on sustainable technology has secured significant funding, marking a strong recovery in the Bay Area tech investment scene.",
            "https://example.com/startup-news",
        ),
        Article::new(
            "San Francisco Hosts Annual Tech Conference",
            "Thousands of tech professionals gathered in San Francisco for the annual technology conference, featuring keynote speeches from industry leaders.",
            "https://example.com/tech-conference",
        ),
        Article::new(
            "Bay Area Companies Lead in Green Technology",
            "Several Bay Area companies are making significant strides in developing sustainable and eco-friendly technology solutions.",
            "https://example.com/green-tech",
        ),
    ]
}
