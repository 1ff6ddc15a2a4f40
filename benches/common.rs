use fake::faker::internet::raw::IPv4;
use fake::locales::EN;
use fake::Fake;

// Generate `count` single-wildcard masks from random IPv4 prefixes.
#[must_use]
pub fn generate_masks(count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let ip: String = IPv4(EN).fake();
            let prefix = ip.rsplit_once('.').map_or(ip.as_str(), |(head, _)| head);
            format!("{prefix}.X")
        })
        .collect()
}
