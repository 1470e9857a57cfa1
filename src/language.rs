//! Extension based language classification.

pub const OTHER: &str = "Other";

const EXTENSIONS: &[(&str, &str)] = &[
    ("bicep", "Bicep"),
    ("json", "JSON"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("tf", "Terraform"),
    ("ps1", "PowerShell"),
    ("psm1", "PowerShell"),
    ("sh", "Shell"),
    ("py", "Python"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("cs", "C#"),
    ("java", "Java"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("rs", "Rust"),
    ("cpp", "C++"),
    ("cxx", "C++"),
    ("cc", "C++"),
    ("c", "C"),
    ("h", "C/C++ Header"),
    ("hpp", "C++ Header"),
    ("hxx", "C++ Header"),
    ("scala", "Scala"),
    ("kt", "Kotlin"),
    ("md", "Markdown"),
    ("csv", "CSV"),
    ("xml", "XML"),
    ("ini", "INI"),
    ("toml", "TOML"),
];

/// Lower-cased text after the last `.` of the final path segment, or `""`.
pub fn extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

pub fn language_for_extension(ext: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or(OTHER)
}

pub fn classify(path: &str) -> &'static str {
    language_for_extension(&extension(path))
}
