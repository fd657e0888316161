use crate::playlist::VariantStream;

/// Pick the variant stream with the highest bandwidth.
/// Ties resolve to the variant listed first.
pub fn highest_bandwidth(variants: &[VariantStream]) -> Option<&VariantStream> {
    let mut selected: Option<&VariantStream> = None;

    for variant in variants {
        match selected {
            Some(x) if x.bandwidth >= variant.bandwidth => (),
            _ => selected = Some(variant),
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::highest_bandwidth;
    use crate::playlist::{Playlist, VariantStream};

    fn variants(bandwidths: &[u64]) -> Vec<VariantStream> {
        bandwidths
            .iter()
            .enumerate()
            .map(|(i, bandwidth)| VariantStream {
                bandwidth: *bandwidth,
                program_id: None,
                codecs: None,
                resolution: None,
                playlist: Playlist::new(
                    format!("https://example.com/{}.m3u8", i).parse().unwrap(),
                ),
            })
            .collect()
    }

    fn selected_path(bandwidths: &[u64]) -> Option<String> {
        highest_bandwidth(&variants(bandwidths)).map(|x| x.playlist.url.path().to_owned())
    }

    #[test]
    fn picks_maximum() {
        assert_eq!(selected_path(&[500, 1200, 900]).as_deref(), Some("/1.m3u8"));
    }

    #[test]
    fn ties_pick_first() {
        assert_eq!(selected_path(&[1200, 1200, 900]).as_deref(), Some("/0.m3u8"));
        assert_eq!(selected_path(&[0, 0]).as_deref(), Some("/0.m3u8"));
    }

    #[test]
    fn empty() {
        assert_eq!(selected_path(&[]), None);
    }
}
