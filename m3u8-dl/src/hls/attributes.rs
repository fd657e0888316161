/// Attribute list of a tag like `#EXT-X-KEY:METHOD=AES-128,URI="key.bin"`.
///
/// Values are either plain (`NAME=value`) or quoted (`NAME="value"`), quoted values
/// may contain commas. If a name occurs more than once the first value wins.
pub(crate) struct Attributes<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Attributes<'a> {
    /// Parse the attributes of a tag line. Everything before the first `:` is
    /// treated as the tag name and skipped.
    pub(crate) fn from_tag(line: &'a str) -> Self {
        match line.split_once(':') {
            Some((_, list)) => Self::parse(list),
            None => Self { pairs: vec![] },
        }
    }

    pub(crate) fn parse(mut input: &'a str) -> Self {
        let mut pairs = vec![];

        while !input.is_empty() {
            let Some((name, rest)) = input.split_once('=') else {
                break;
            };

            // Tokens without a value, e.g. "A,B=1", are dropped.
            let name = name.rsplit(',').next().unwrap_or(name).trim();

            let (value, rest) = if let Some(quoted) = rest.strip_prefix('"') {
                match quoted.split_once('"') {
                    Some((value, rest)) => (value, rest.split_once(',').map_or("", |x| x.1)),
                    None => (quoted, ""),
                }
            } else {
                match rest.split_once(',') {
                    Some((value, rest)) => (value, rest),
                    None => (rest, ""),
                }
            };

            pairs.push((name, value.trim()));
            input = rest;
        }

        Self { pairs }
    }

    /// Value of the attribute called exactly `name`. Unlike a substring search,
    /// `BANDWIDTH` never matches `AVERAGE-BANDWIDTH`.
    pub(crate) fn get(&self, name: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(x, _)| *x == name)
            .map(|(_, value)| *value)
            .filter(|x| !x.is_empty())
    }
}
