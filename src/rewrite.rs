//! Rewrite relative source-root paths in backend output.
//!
//! Ninja runs in the build directory, so compiler diagnostics name files
//! relative to it (`../../base/file.cc`). IDEs resolve such paths against
//! the wrong directory; replacing the relative source root with its absolute
//! form fixes that. Occurrences preceded by `/` are part of a longer path and
//! are left alone.

/// Replaces the relative source root with the absolute one, line by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRootRewriter {
    relative: String,
    absolute: String,
}

impl SourceRootRewriter {
    /// Rewrite occurrences of `relative` to `absolute`.
    #[must_use]
    pub fn new(relative: impl Into<String>, absolute: impl Into<String>) -> Self {
        Self {
            relative: relative.into(),
            absolute: absolute.into(),
        }
    }

    /// Rewrite one line of output.
    ///
    /// The line is scanned left to right. Each match not preceded by `/` is
    /// replaced and scanning resumes after it, so a match directly following
    /// a replacement counts as unpreceded.
    ///
    /// # Examples
    ///
    /// ```
    /// use pbxgen::rewrite::SourceRootRewriter;
    ///
    /// let rewriter = SourceRootRewriter::new("../..", "/src");
    /// assert_eq!(
    ///     rewriter.rewrite_line("../../a.cc:1: see /x/../../b.h"),
    ///     "/src/a.cc:1: see /x/../../b.h",
    /// );
    /// ```
    #[must_use]
    pub fn rewrite_line(&self, line: &str) -> String {
        if self.relative.is_empty() {
            return line.to_owned();
        }
        let mut rewritten = String::with_capacity(line.len());
        let mut rest = line;
        while let Some(position) = self.find_unpreceded(rest) {
            let (head, tail) = rest.split_at(position);
            rewritten.push_str(head);
            rewritten.push_str(&self.absolute);
            rest = tail.strip_prefix(self.relative.as_str()).unwrap_or(tail);
        }
        rewritten.push_str(rest);
        rewritten
    }

    /// Byte offset of the first match in `text` not preceded by `/`.
    fn find_unpreceded(&self, text: &str) -> Option<usize> {
        let mut offset = 0;
        while let Some(found) = text.get(offset..).and_then(|t| t.find(self.relative.as_str())) {
            let position = offset + found;
            let preceded = text
                .get(..position)
                .is_some_and(|before| before.ends_with('/'));
            if !preceded {
                return Some(position);
            }
            let step = text
                .get(position..)
                .and_then(|t| t.chars().next())
                .map_or(1, char::len_utf8);
            offset = position + step;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("../../base/a.cc:3:1: error", "/work/src/base/a.cc:3:1: error")]
    #[case("/x/../../b.h", "/x/../../b.h")]
    #[case(
        "../../a.cc: note: in /y/../../c.h and ../../d.h",
        "/work/src/a.cc: note: in /y/../../c.h and /work/src/d.h"
    )]
    #[case("ninja: no work to do.", "ninja: no work to do.")]
    #[case("../..../..", "/work/src/work/src")]
    fn rewrites_unpreceded_occurrences(#[case] line: &str, #[case] expected: &str) {
        let rewriter = SourceRootRewriter::new("../..", "/work/src");
        assert_eq!(rewriter.rewrite_line(line), expected);
    }

    #[test]
    fn empty_relative_root_leaves_lines_alone() {
        let rewriter = SourceRootRewriter::new("", "/work/src");
        assert_eq!(rewriter.rewrite_line("../../a.cc"), "../../a.cc");
    }
}
