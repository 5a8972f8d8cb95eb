//! File type inference from extensions.

/// Extension to Xcode file type, sorted by extension.
const FILE_TYPES: &[(&str, &str)] = &[
    ("a", "archive.ar"),
    ("app", "wrapper.application"),
    ("appex", "wrapper.app-extension"),
    ("bdic", "file"),
    ("bundle", "wrapper.cfbundle"),
    ("c", "sourcecode.c.c"),
    ("cc", "sourcecode.cpp.cpp"),
    ("cpp", "sourcecode.cpp.cpp"),
    ("css", "text.css"),
    ("cxx", "sourcecode.cpp.cpp"),
    ("dart", "sourcecode"),
    ("dylib", "compiled.mach-o.dylib"),
    ("framework", "wrapper.framework"),
    ("h", "sourcecode.c.h"),
    ("hxx", "sourcecode.cpp.h"),
    ("icns", "image.icns"),
    ("java", "sourcecode.java"),
    ("js", "sourcecode.javascript"),
    ("kt", "sourcecode"),
    ("m", "sourcecode.c.objc"),
    ("mm", "sourcecode.cpp.objcpp"),
    ("nib", "wrapper.nib"),
    ("o", "compiled.mach-o.objfile"),
    ("pdf", "image.pdf"),
    ("pl", "text.script.perl"),
    ("plist", "text.plist.xml"),
    ("pm", "text.script.perl"),
    ("png", "image.png"),
    ("py", "text.script.python"),
    ("r", "sourcecode.rez"),
    ("rez", "sourcecode.rez"),
    ("s", "sourcecode.asm"),
    ("storyboard", "file.storyboard"),
    ("strings", "text.plist.strings"),
    ("swift", "sourcecode.swift"),
    ("ttf", "file"),
    ("xcassets", "folder.assetcatalog"),
    ("xcconfig", "text.xcconfig"),
    ("xcdatamodel", "wrapper.xcdatamodel"),
    ("xcdatamodeld", "wrapper.xcdatamodeld"),
    ("xctest", "wrapper.cfbundle"),
    ("xib", "file.xib"),
    ("y", "sourcecode.yacc"),
];

/// Extensions compiled by the indexing target.
const INDEXABLE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "m", "mm", "swift"];

/// The extension of the last component of `path`, without the dot.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Xcode file type for `ext`; unknown extensions are `text`.
#[must_use]
pub fn file_type_for_extension(ext: &str) -> &'static str {
    FILE_TYPES
        .binary_search_by(|(candidate, _)| candidate.cmp(&ext))
        .ok()
        .and_then(|index| FILE_TYPES.get(index))
        .map_or("text", |(_, file_type)| file_type)
}

/// Xcode file type for the file at `path`.
#[must_use]
pub fn file_type_for_path(path: &str) -> &'static str {
    extension(path).map_or("text", file_type_for_extension)
}

/// Whether files with extension `ext` are compiled for indexing.
#[must_use]
pub fn is_source_file_for_indexing(ext: &str) -> bool {
    INDEXABLE_EXTENSIONS.contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn table_is_sorted() {
        assert!(FILE_TYPES.windows(2).all(|pair| match pair {
            [(a, _), (b, _)] => a < b,
            _ => false,
        }));
    }

    #[rstest]
    #[case("foo/bar.mm", "sourcecode.cpp.objcpp")]
    #[case("Foo.app", "wrapper.application")]
    #[case("FooTests.xctest", "wrapper.cfbundle")]
    #[case("base/BUILD.gn", "text")]
    #[case("Makefile", "text")]
    #[case("dir.d/README", "text")]
    fn infers_types(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(file_type_for_path(path), expected);
    }

    #[rstest]
    #[case("cc", true)]
    #[case("swift", true)]
    #[case("h", false)]
    #[case("gn", false)]
    fn indexable_extensions(#[case] ext: &str, #[case] expected: bool) {
        assert_eq!(is_source_file_for_indexing(ext), expected);
    }
}
