//! Technology families and ecosystem markers

/// Extensions that share a vocabulary
pub struct Family {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub vocabulary: &'static [&'static str],
}

/// A stack recognized by a distinctive file name
pub struct Ecosystem {
    pub name: &'static str,
    pub markers: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub vocabulary: &'static [&'static str],
}

pub const FAMILIES: &[Family] = &[
    Family {
        name: "frontend",
        extensions: &[".html", ".htm", ".css", ".scss", ".sass", ".less", ".js", ".jsx", ".ts", ".tsx", ".vue", ".svelte"],
        vocabulary: &["frontend", "html", "css", "javascript", "typescript", "react", "vue", "svelte", "web", "ui", "component", "components"],
    },
    Family {
        name: "python",
        extensions: &[".py", ".pyi", ".ipynb"],
        vocabulary: &["python", "script", "scripts", "django", "flask", "pandas", "notebook", "jupyter"],
    },
    Family {
        name: "query",
        extensions: &[".sql", ".graphql", ".gql", ".prisma"],
        vocabulary: &["sql", "database", "databases", "query", "queries", "schema", "graphql", "migration", "migrations"],
    },
    Family {
        name: "config",
        extensions: &[".json", ".yaml", ".yml", ".toml", ".ini", ".env", ".xml"],
        vocabulary: &["config", "configuration", "json", "yaml", "toml", "ci", "pipeline", "settings"],
    },
    Family {
        name: "documents",
        extensions: &[".pdf", ".doc", ".docx", ".odt", ".rtf"],
        vocabulary: &["pdf", "document", "documents", "word", "docx"],
    },
    Family {
        name: "spreadsheet",
        extensions: &[".xls", ".xlsx", ".ods", ".csv", ".tsv"],
        vocabulary: &["excel", "spreadsheet", "spreadsheets", "csv", "data", "table", "tables"],
    },
    Family {
        name: "presentation",
        extensions: &[".ppt", ".pptx", ".odp", ".key"],
        vocabulary: &["powerpoint", "presentation", "presentations", "slides", "deck"],
    },
    Family {
        name: "docs",
        extensions: &[".md", ".mdx", ".rst", ".adoc", ".txt"],
        vocabulary: &["markdown", "docs", "documentation", "readme", "writing"],
    },
    Family {
        name: "rust",
        extensions: &[".rs"],
        vocabulary: &["rust", "cargo", "crate", "crates"],
    },
    Family {
        name: "go",
        extensions: &[".go"],
        vocabulary: &["go", "golang"],
    },
    Family {
        name: "jvm",
        extensions: &[".java", ".kt", ".kts", ".scala", ".groovy"],
        vocabulary: &["java", "kotlin", "scala", "jvm", "spring", "gradle", "maven"],
    },
    Family {
        name: "shell",
        extensions: &[".sh", ".bash", ".zsh", ".fish", ".ps1"],
        vocabulary: &["shell", "bash", "zsh", "powershell", "terminal", "cli"],
    },
];

pub const ECOSYSTEMS: &[Ecosystem] = &[
    Ecosystem {
        name: "node",
        markers: &["package.json"],
        extensions: &[".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx"],
        vocabulary: &["node", "nodejs", "npm", "yarn", "pnpm", "javascript", "typescript"],
    },
    Ecosystem {
        name: "python",
        markers: &["requirements.txt", "pyproject.toml", "setup.py", "Pipfile"],
        extensions: &[".py", ".pyi", ".ipynb"],
        vocabulary: &["python", "pip", "pypi", "poetry", "virtualenv"],
    },
    Ecosystem {
        name: "rust",
        markers: &["Cargo.toml"],
        extensions: &[".rs"],
        vocabulary: &["rust", "cargo", "crate", "crates"],
    },
    Ecosystem {
        name: "go",
        markers: &["go.mod"],
        extensions: &[".go"],
        vocabulary: &["go", "golang", "module", "modules"],
    },
    Ecosystem {
        name: "jvm",
        markers: &["pom.xml", "build.gradle", "build.gradle.kts"],
        extensions: &[".java", ".kt", ".kts", ".scala"],
        vocabulary: &["java", "kotlin", "jvm", "maven", "gradle"],
    },
    Ecosystem {
        name: "ruby",
        markers: &["Gemfile"],
        extensions: &[".rb", ".erb", ".rake"],
        vocabulary: &["ruby", "rails", "gem", "gems", "bundler"],
    },
    Ecosystem {
        name: "php",
        markers: &["composer.json"],
        extensions: &[".php"],
        vocabulary: &["php", "composer", "laravel", "symfony"],
    },
];

pub fn families_for(extension: &str) -> impl Iterator<Item = &'static Family> + '_ {
    FAMILIES
        .iter()
        .filter(move |family| family.extensions.contains(&extension))
}

pub fn is_marker(file_name: &str) -> bool {
    ECOSYSTEMS
        .iter()
        .any(|eco| eco.markers.contains(&file_name))
}
