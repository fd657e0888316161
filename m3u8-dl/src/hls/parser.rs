use super::attributes::Attributes;
use crate::{
    error::{Error, Result},
    playlist::{Key, KeyMethod, KeyScope, Playlist, Segment, VariantStream},
};
use url::Url;

const SEGMENT_EXTENSION: &str = ".ts";
const PLAYLIST_EXTENSION: &str = ".m3u8";

/// Parse the text of a master or media playlist fetched from `url`.
///
/// Parsing is permissive, unknown tags and lines are skipped. Only malformed
/// numeric tags, unsupported key methods and variant streams without
/// `BANDWIDTH` are errors.
pub fn parse(url: &Url, text: &str, key_scope: KeyScope) -> Result<Playlist> {
    let mut playlist = Playlist::new(url.clone());
    let mut pending_key = None;
    let mut pending_variant = None;

    for line in text.lines().map(|x| x.trim()) {
        if line.is_empty() || line.starts_with("#EXTINF:") {
            continue;
        } else if line == "#EXTM3U" {
            playlist.is_m3u8 = true;
        } else if let Some(value) = line.strip_prefix("#EXT-X-VERSION:") {
            playlist.version = Some(parse_number("#EXT-X-VERSION", value)?);
        } else if let Some(value) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
            playlist.target_duration = Some(parse_number("#EXT-X-TARGETDURATION", value)?);
        } else if let Some(value) = line.strip_prefix("#EXT-X-MEDIA-SEQUENCE:") {
            playlist.media_sequence = Some(parse_number("#EXT-X-MEDIA-SEQUENCE", value)?);
        } else if line.starts_with("#EXT-X-KEY") {
            pending_key = Some(parse_key(&playlist, line)?);
        } else if line.starts_with("#EXT-X-STREAM-INF:") {
            pending_variant = Some(parse_stream_inf(&playlist, line)?);
        } else if line.starts_with('#') {
            continue;
        } else if is_segment(line) {
            let key = match key_scope {
                KeyScope::NextSegment => pending_key.take(),
                KeyScope::UntilReplaced => pending_key.clone(),
            };

            playlist.segments.push(Segment {
                index: playlist.segments.len(),
                url: playlist.resolve(line)?,
                path: None,
                key,
            });
        } else if line.ends_with(PLAYLIST_EXTENSION) {
            if let Some(mut variant) = pending_variant.take() {
                variant.playlist.url = playlist.resolve(line)?;
                playlist.variants.push(variant);
            }
        }
    }

    Ok(playlist)
}

fn is_segment(line: &str) -> bool {
    line.ends_with(SEGMENT_EXTENSION) || line.contains(".ts?")
}

fn parse_number(tag: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::manifest(format!("invalid {} value {:?}", tag, value)))
}

fn parse_key(playlist: &Playlist, line: &str) -> Result<Key> {
    let attrs = Attributes::from_tag(line);
    let method = attrs
        .get("METHOD")
        .ok_or_else(|| Error::manifest(format!("missing METHOD in {}", line)))?
        .parse::<KeyMethod>()?;

    let uri = match attrs.get("URI") {
        Some(uri) => Some(playlist.resolve(uri)?),
        None => None,
    };

    if method == KeyMethod::Aes128 && uri.is_none() {
        return Err(Error::manifest(format!("missing URI in {}", line)));
    }

    let key = Key {
        method,
        uri,
        iv: attrs.get("IV").map(|x| x.to_owned()),
    };

    key.iv()?;
    Ok(key)
}

fn parse_stream_inf(playlist: &Playlist, line: &str) -> Result<VariantStream> {
    let attrs = Attributes::from_tag(line);
    let bandwidth = attrs
        .get("BANDWIDTH")
        .ok_or_else(|| Error::manifest(format!("missing BANDWIDTH in {}", line)))?
        .parse::<u64>()
        .map_err(|_| Error::manifest(format!("invalid BANDWIDTH in {}", line)))?;

    let mut sub_playlist = Playlist::new(playlist.url.clone());
    sub_playlist.base_url = playlist.base_url.clone();

    Ok(VariantStream {
        bandwidth,
        program_id: attrs.get("PROGRAM-ID").and_then(|x| x.parse::<u64>().ok()),
        codecs: attrs.get("CODECS").map(|x| x.to_owned()),
        resolution: attrs
            .get("RESOLUTION")
            .filter(|x| is_resolution(x))
            .map(|x| x.to_owned()),
        playlist: sub_playlist,
    })
}

fn is_resolution(value: &str) -> bool {
    match value.split_once('x') {
        Some((w, h)) => {
            !w.is_empty()
                && !h.is_empty()
                && w.chars().all(|x| x.is_ascii_digit())
                && h.chars().all(|x| x.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        "https://example.com/vod/index.m3u8".parse().unwrap()
    }

    fn parse_text(text: &str) -> Result<Playlist> {
        parse(&url(), text, KeyScope::NextSegment)
    }

    #[test]
    fn media_playlist() {
        let playlist = parse_text(
            "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:7

#EXTINF:9.97,
seg-0.ts
#EXTINF:9.97,
/abs/seg-1.ts?token=1
#EXTINF:4.2,
https://mirror.example.org/seg-2.ts
#EXT-X-ENDLIST
",
        )
        .unwrap();

        assert!(playlist.is_m3u8);
        assert!(!playlist.is_master());
        assert_eq!(playlist.version, Some(3));
        assert_eq!(playlist.target_duration, Some(10));
        assert_eq!(playlist.media_sequence, Some(7));
        assert!(playlist.variants.is_empty());

        let urls = playlist
            .segments
            .iter()
            .map(|x| (x.index, x.url.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                (0, "https://example.com/vod/seg-0.ts"),
                (1, "https://example.com/abs/seg-1.ts?token=1"),
                (2, "https://mirror.example.org/seg-2.ts"),
            ]
        );
    }

    #[test]
    fn missing_marker_is_not_fatal() {
        let playlist = parse_text("#EXTINF:1,\n0.ts\n").unwrap();

        assert!(!playlist.is_m3u8);
        assert_eq!(playlist.segments.len(), 1);
        assert!(playlist.validate().is_err());
    }

    #[test]
    fn malformed_numbers() {
        for text in [
            "#EXTM3U\n#EXT-X-VERSION:three\n",
            "#EXTM3U\n#EXT-X-TARGETDURATION:\n",
            "#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:-1\n",
        ] {
            assert!(matches!(parse_text(text), Err(Error::Manifest(_))), "{}", text);
        }
    }

    #[test]
    fn key_applies_to_next_segment_only() {
        let playlist = parse_text(
            r#"#EXTM3U
#EXT-X-KEY:METHOD=AES-128,URI="keys/k1.bin",IV=0x00000000000000000000000000000001
#EXTINF:10,
0.ts
#EXTINF:10,
1.ts
#EXT-X-KEY:METHOD=NONE
2.ts
"#,
        )
        .unwrap();

        let key = playlist.segments[0].key.as_ref().unwrap();
        assert_eq!(key.method, KeyMethod::Aes128);
        assert_eq!(
            key.uri.as_ref().unwrap().as_str(),
            "https://example.com/vod/keys/k1.bin"
        );
        assert_eq!(
            key.iv.as_deref(),
            Some("0x00000000000000000000000000000001")
        );
        assert!(playlist.segments[1].key.is_none());
        assert_eq!(
            playlist.segments[2].key.as_ref().unwrap().method,
            KeyMethod::None
        );
    }

    #[test]
    fn key_until_replaced() {
        let playlist = parse(
            &url(),
            r#"#EXTM3U
#EXT-X-KEY:METHOD=AES-128,URI="k1"
0.ts
1.ts
#EXT-X-KEY:METHOD=AES-128,URI="k2"
2.ts
"#,
            KeyScope::UntilReplaced,
        )
        .unwrap();

        let uris = playlist
            .segments
            .iter()
            .map(|x| x.key.as_ref().unwrap().uri.as_ref().unwrap().path().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(uris, vec!["/vod/k1", "/vod/k1", "/vod/k2"]);
    }

    #[test]
    fn unsupported_key_methods() {
        for line in [
            r#"#EXT-X-KEY:METHOD=SAMPLE-AES,URI="k""#,
            r#"#EXT-X-KEY:URI="k""#,
            "#EXT-X-KEY:METHOD=AES-128",
            r#"#EXT-X-KEY:METHOD=AES-128,URI="k",IV=0xNOTHEX"#,
        ] {
            assert!(
                matches!(parse_text(&format!("#EXTM3U\n{}\n0.ts\n", line)), Err(Error::Manifest(_))),
                "{}",
                line
            );
        }
    }

    #[test]
    fn master_playlist() {
        let playlist = parse_text(
            r#"#EXTM3U
#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=500,RESOLUTION=640x360
low/index.m3u8
#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=1200,CODECS="avc1.64001f,mp4a.40.2",RESOLUTION=1280x720
/hd/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=900,RESOLUTION=wide
mid.m3u8
"#,
        )
        .unwrap();

        assert!(playlist.is_master());
        assert_eq!(playlist.variants.len(), 3);

        let hd = &playlist.variants[1];
        assert_eq!(hd.bandwidth, 1200);
        assert_eq!(hd.program_id, Some(1));
        assert_eq!(hd.codecs.as_deref(), Some("avc1.64001f,mp4a.40.2"));
        assert_eq!(hd.resolution.as_deref(), Some("1280x720"));
        assert_eq!(hd.playlist.url.as_str(), "https://example.com/hd/index.m3u8");
        assert_eq!(hd.playlist.base_url.as_str(), "https://example.com/");
        assert!(!hd.playlist.is_m3u8);

        assert_eq!(
            playlist.variants[0].playlist.url.as_str(),
            "https://example.com/vod/low/index.m3u8"
        );
        assert_eq!(playlist.variants[2].resolution, None);
        assert_eq!(playlist.variants[2].program_id, None);
    }

    #[test]
    fn stream_inf_without_bandwidth() {
        let result = parse_text(
            "#EXTM3U\n#EXT-X-STREAM-INF:PROGRAM-ID=1,CODECS=\"mp4a.40.2\"\naudio.m3u8\n",
        );
        assert!(matches!(result, Err(Error::Manifest(_))));

        let result = parse_text("#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=fast\naudio.m3u8\n");
        assert!(matches!(result, Err(Error::Manifest(_))));
    }

    #[test]
    fn average_bandwidth_is_not_bandwidth() {
        let result = parse_text("#EXTM3U\n#EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=100\nlow.m3u8\n");
        assert!(matches!(result, Err(Error::Manifest(_))));

        let playlist = parse_text(
            "#EXTM3U\n#EXT-X-STREAM-INF:AVERAGE-BANDWIDTH=100,BANDWIDTH=300\nlow.m3u8\n",
        )
        .unwrap();
        assert_eq!(playlist.variants[0].bandwidth, 300);
    }

    #[test]
    fn playlist_reference_needs_stream_inf() {
        let playlist = parse_text("#EXTM3U\nother.m3u8\n").unwrap();
        assert!(playlist.variants.is_empty());
    }

    #[test]
    fn tags_are_never_segments() {
        let playlist =
            parse_text("#EXTM3U\n#EXT-X-MAP:URI=\"init.ts\"\n#EXT-X-PREFETCH:next.ts\n0.ts\n")
                .unwrap();

        assert_eq!(playlist.segments.len(), 1);
        assert_eq!(playlist.segments[0].url.as_str(), "https://example.com/vod/0.ts");
    }

    #[test]
    fn unknown_lines_are_skipped() {
        let playlist = parse_text("#EXTM3U\n#EXT-X-ALLOW-CACHE:YES\nreadme.txt\n  0.ts  \r\n").unwrap();

        assert_eq!(playlist.segments.len(), 1);
    }
}
