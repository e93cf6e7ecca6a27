// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use super::types::ParseResult;

pub(super) fn digit(chr : u8) -> bool {
    return chr.is_ascii_digit()
}

/// Keeps only the characters of `word` that appear in `filter`, in their
/// original order.
pub(super) fn char_filter(word : &str, filter : &str) -> String {
    return word.chars().filter(|chr| filter.contains(*chr)).collect()
}

pub(super) fn take_while<'a>(word : &'a str, cond : fn(u8) -> bool) -> ParseResult<'a> {
    let new_start = word
        .as_bytes()
        .iter()
        .position(|chr| !cond(*chr))
        .unwrap_or(word.len());

    return
        ParseResult{
            matched  : &word[0..new_start],
            residual : &word[new_start..]
        };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn charfilter() {
        let teststr1 = "abcd ;,!$ 12345 xyz";
        assert_eq!(char_filter(teststr1, "abcdxyz"), "abcdxyz");
        assert_eq!(char_filter(teststr1, "54321xaybcdz"), "abcd12345xyz");
        assert_eq!(char_filter(teststr1, ""), "");
    }

    #[test]
    fn take_while_digits() {
        let res = take_while("100ps", digit);
        assert_eq!(res.matched, "100");
        assert_eq!(res.residual, "ps");

        let res = take_while("ns", digit);
        assert_eq!(res.matched, "");
        assert_eq!(res.residual, "ns");

        let res = take_while("10", digit);
        assert_eq!(res.residual, "");
    }
}
