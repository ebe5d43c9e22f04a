use camino::Utf8Path;
use globset::GlobSet;
use once_cell::sync::Lazy;
use promptlift_utils::error::AnalyzerError;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use tracing::debug;

use crate::walk::{self, WalkLimits};
use crate::{AnalysisRecord, Analyzer, TechStack};

/// Depth of the file-extension census
const CENSUS_DEPTH: usize = 6;

/// Files inspected by the census before it stops
const CENSUS_MAX_ENTRIES: usize = 5_000;

type ManifestParser = fn(&str) -> Result<Vec<String>, String>;

/// `(file name, implied language, dependency parser)`
const MANIFESTS: &[(&str, &str, ManifestParser)] = &[
    ("package.json", "JavaScript", parse_json_deps),
    ("Cargo.toml", "Rust", parse_cargo_toml),
    ("pyproject.toml", "Python", parse_pyproject),
    ("requirements.txt", "Python", parse_requirements),
    ("go.mod", "Go", parse_go_mod),
    ("Gemfile", "Ruby", parse_gemfile),
    ("pom.xml", "Java", parse_pom),
    ("build.gradle", "Java", parse_gradle),
    ("build.gradle.kts", "Kotlin", parse_gradle),
    ("composer.json", "PHP", parse_json_deps),
];

/// `(path relative to root, tool label)`
const WELL_KNOWN_FILES: &[(&str, &str)] = &[
    ("Dockerfile", "docker"),
    ("docker-compose.yml", "docker-compose"),
    ("docker-compose.yaml", "docker-compose"),
    ("compose.yaml", "docker-compose"),
    ("compose.yml", "docker-compose"),
    ("Makefile", "make"),
    (".github/workflows", "github-actions"),
    (".gitlab-ci.yml", "gitlab-ci"),
];

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("py", "Python"),
    ("js", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("swift", "Swift"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("php", "PHP"),
    ("scala", "Scala"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("dart", "Dart"),
    ("lua", "Lua"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zig", "Zig"),
    ("hs", "Haskell"),
    ("ml", "OCaml"),
    ("clj", "Clojure"),
];

/// `(keyword, label)`; a trailing `*` matches by prefix
const FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "react"),
    ("next", "next.js"),
    ("vue", "vue"),
    ("nuxt", "nuxt"),
    ("angular", "angular"),
    ("svelte", "svelte"),
    ("solid-js", "solid"),
    ("gatsby", "gatsby"),
    ("express", "express"),
    ("fastify", "fastify"),
    ("koa", "koa"),
    ("nestjs", "nestjs"),
    ("electron", "electron"),
    ("react-native", "react-native"),
    ("django", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
    ("starlette", "starlette"),
    ("tornado", "tornado"),
    ("rails", "rails"),
    ("sinatra", "sinatra"),
    ("spring-boot*", "spring-boot"),
    ("quarkus*", "quarkus"),
    ("laravel", "laravel"),
    ("symfony", "symfony"),
    ("gin", "gin"),
    ("echo", "echo"),
    ("fiber", "fiber"),
    ("actix-web", "actix-web"),
    ("axum", "axum"),
    ("rocket", "rocket"),
    ("warp", "warp"),
    ("tokio", "tokio"),
    ("tauri", "tauri"),
    ("leptos", "leptos"),
    ("yew", "yew"),
    ("bevy", "bevy"),
];

const DATABASES: &[(&str, &str)] = &[
    ("pg", "postgresql"),
    ("postgres", "postgresql"),
    ("postgresql", "postgresql"),
    ("psycopg", "postgresql"),
    ("psycopg2", "postgresql"),
    ("psycopg2-binary", "postgresql"),
    ("asyncpg", "postgresql"),
    ("tokio-postgres", "postgresql"),
    ("pq", "postgresql"),
    ("mysql", "mysql"),
    ("mysql2", "mysql"),
    ("pymysql", "mysql"),
    ("mysqlclient", "mysql"),
    ("sqlite", "sqlite"),
    ("sqlite3", "sqlite"),
    ("better-sqlite3", "sqlite"),
    ("rusqlite", "sqlite"),
    ("mongodb", "mongodb"),
    ("mongoose", "mongodb"),
    ("pymongo", "mongodb"),
    ("redis", "redis"),
    ("ioredis", "redis"),
    ("elasticsearch", "elasticsearch"),
    ("cassandra-driver", "cassandra"),
    ("neo4j*", "neo4j"),
    ("prisma", "prisma"),
    ("sequelize", "sequelize"),
    ("typeorm", "typeorm"),
    ("drizzle-orm", "drizzle"),
    ("diesel", "diesel"),
    ("sqlx", "sqlx"),
    ("sea-orm", "sea-orm"),
    ("sqlalchemy", "sqlalchemy"),
    ("gorm", "gorm"),
];

const TOOLS: &[(&str, &str)] = &[
    ("typescript", "typescript"),
    ("webpack", "webpack"),
    ("vite", "vite"),
    ("rollup", "rollup"),
    ("esbuild", "esbuild"),
    ("babel", "babel"),
    ("jest", "jest"),
    ("vitest", "vitest"),
    ("mocha", "mocha"),
    ("cypress", "cypress"),
    ("playwright", "playwright"),
    ("eslint", "eslint"),
    ("prettier", "prettier"),
    ("storybook", "storybook"),
    ("tailwindcss", "tailwind"),
    ("pytest", "pytest"),
    ("black", "black"),
    ("ruff", "ruff"),
    ("mypy", "mypy"),
    ("celery", "celery"),
    ("serde", "serde"),
    ("clap", "clap"),
    ("tracing", "tracing"),
    ("junit*", "junit"),
    ("mockito*", "mockito"),
    ("lombok", "lombok"),
    ("rspec*", "rspec"),
    ("rubocop", "rubocop"),
    ("phpunit", "phpunit"),
];

static REQUIREMENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._\-]*)").expect("static regex is valid"));
static GEM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*gem\s+['"]([^'"]+)['"]"#).expect("static regex is valid"));
static POM_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").expect("static regex is valid"));
static GRADLE_COORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]([A-Za-z0-9_.\-]+):([A-Za-z0-9_.\-]+)(?::[^'"]*)?['"]"#)
        .expect("static regex is valid")
});

/// Detects languages, frameworks, databases and tools from manifests,
/// well-known files and a bounded file-extension census.
#[derive(Debug, Clone)]
pub struct TechStackAnalyzer {
    ignore: GlobSet,
}

impl TechStackAnalyzer {
    #[must_use]
    pub fn new(ignore: GlobSet) -> Self {
        Self { ignore }
    }

    fn census(&self, root: &Utf8Path) -> Result<Vec<String>, AnalyzerError> {
        // language -> (file count, first seen)
        let mut counts: HashMap<&'static str, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;
        let limits = WalkLimits {
            max_depth: CENSUS_DEPTH,
            max_entries: CENSUS_MAX_ENTRIES,
        };

        walk::walk(root, &self.ignore, limits, &mut |entry| {
            if entry.is_dir {
                return;
            }
            let Some(ext) = entry.relative.extension() else {
                return;
            };
            if let Some((_, language)) = EXTENSION_LANGUAGES.iter().find(|(e, _)| *e == ext) {
                let slot = counts.entry(*language).or_insert((0, seen));
                slot.0 += 1;
                seen += 1;
            }
        })?;

        let mut ranked: Vec<_> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
        Ok(ranked.into_iter().map(|(lang, _)| lang.to_string()).collect())
    }
}

impl Analyzer for TechStackAnalyzer {
    fn name(&self) -> &'static str {
        "tech_stack"
    }

    fn analyze(&self, root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
        let mut stack = TechStack::default();
        for language in self.census(root)? {
            push_unique(&mut stack.languages, &language);
        }

        for (file, language, parser) in MANIFESTS {
            let path = root.join(file);
            if !path.is_file() {
                continue;
            }
            push_unique(&mut stack.languages, language);

            let deps = match fs::read_to_string(&path) {
                Ok(content) => parser(&content),
                Err(e) => Err(e.to_string()),
            };
            match deps {
                Ok(deps) => {
                    for dep in deps {
                        classify(&dep, &mut stack);
                    }
                }
                Err(reason) => debug!(file = %file, reason = %reason, "Skipping unreadable manifest"),
            }
        }

        if root.join("tsconfig.json").is_file() {
            push_unique(&mut stack.languages, "TypeScript");
        }
        for (relative, tool) in WELL_KNOWN_FILES {
            if root.join(relative).exists() {
                push_unique(&mut stack.tools, tool);
            }
        }

        Ok(AnalysisRecord::TechStack(stack))
    }

    fn empty_record(&self) -> AnalysisRecord {
        AnalysisRecord::TechStack(TechStack::default())
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn keyword_matches(keyword: &str, dep: &str) -> bool {
    let segments = dep.split(['/', ':', '@']).filter(|s| !s.is_empty());
    match keyword.strip_suffix('*') {
        Some(prefix) => dep.starts_with(prefix) || segments.into_iter().any(|s| s.starts_with(prefix)),
        None => dep == keyword || segments.into_iter().any(|s| s == keyword),
    }
}

fn classify(dep: &str, stack: &mut TechStack) {
    let dep = dep.trim().to_ascii_lowercase();
    if dep.is_empty() {
        return;
    }
    for (table, list) in [
        (FRAMEWORKS, &mut stack.frameworks),
        (DATABASES, &mut stack.databases),
        (TOOLS, &mut stack.tools),
    ] {
        if let Some((_, label)) = table.iter().find(|(keyword, _)| keyword_matches(keyword, &dep)) {
            push_unique(list, label);
        }
    }
}

fn json_object_keys(value: &serde_json::Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(|v| v.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}

/// `package.json` and `composer.json`
fn parse_json_deps(content: &str) -> Result<Vec<String>, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok([
        "dependencies",
        "devDependencies",
        "peerDependencies",
        "require",
        "require-dev",
    ]
    .iter()
    .flat_map(|field| json_object_keys(&value, field))
    .collect())
}

fn parse_toml(content: &str) -> Result<toml::Value, String> {
    toml::from_str::<toml::Table>(content)
        .map(toml::Value::Table)
        .map_err(|e| e.to_string())
}

fn toml_table_keys(value: &toml::Value, path: &[&str]) -> Vec<String> {
    let mut current = value;
    for key in path {
        match current.get(*key) {
            Some(next) => current = next,
            None => return Vec::new(),
        }
    }
    current
        .as_table()
        .map(|t| t.keys().cloned().collect())
        .unwrap_or_default()
}

fn parse_cargo_toml(content: &str) -> Result<Vec<String>, String> {
    let value = parse_toml(content)?;
    let sections: [&[&str]; 4] = [
        &["dependencies"],
        &["dev-dependencies"],
        &["build-dependencies"],
        &["workspace", "dependencies"],
    ];
    Ok(sections
        .iter()
        .flat_map(|path| toml_table_keys(&value, path))
        .collect())
}

fn requirement_name(spec: &str) -> Option<String> {
    REQUIREMENT_NAME
        .captures(spec)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_pyproject(content: &str) -> Result<Vec<String>, String> {
    let value = parse_toml(content)?;
    let mut deps = Vec::new();

    if let Some(list) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        deps.extend(list.iter().filter_map(|v| v.as_str()).filter_map(requirement_name));
    }
    if let Some(groups) = value
        .get("project")
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(|d| d.as_table())
    {
        for list in groups.values().filter_map(|v| v.as_array()) {
            deps.extend(list.iter().filter_map(|v| v.as_str()).filter_map(requirement_name));
        }
    }
    deps.extend(
        toml_table_keys(&value, &["tool", "poetry", "dependencies"])
            .into_iter()
            .filter(|name| name != "python"),
    );
    deps.extend(toml_table_keys(&value, &["tool", "poetry", "dev-dependencies"]));
    Ok(deps)
}

fn parse_requirements(content: &str) -> Result<Vec<String>, String> {
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(requirement_name)
        .collect())
}

fn parse_go_mod(content: &str) -> Result<Vec<String>, String> {
    let mut deps = Vec::new();
    let mut in_block = false;
    for line in content.lines().map(str::trim) {
        if line.starts_with("require (") {
            in_block = true;
        } else if in_block && line.starts_with(')') {
            in_block = false;
        } else if in_block {
            if let Some(module) = line.split_whitespace().next()
                && !module.starts_with("//")
            {
                deps.push(module.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("require ")
            && let Some(module) = rest.split_whitespace().next()
        {
            deps.push(module.to_string());
        }
    }
    Ok(deps)
}

fn parse_gemfile(content: &str) -> Result<Vec<String>, String> {
    Ok(GEM_NAME
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect())
}

fn parse_pom(content: &str) -> Result<Vec<String>, String> {
    Ok(POM_ARTIFACT
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect())
}

fn parse_gradle(content: &str) -> Result<Vec<String>, String> {
    Ok(GRADLE_COORD
        .captures_iter(content)
        .filter_map(|c| Some(format!("{}:{}", c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::build_ignore_set;
    use promptlift_utils::test_support::ProjectFixture;

    fn analyze(fixture: &ProjectFixture) -> TechStack {
        let analyzer = TechStackAnalyzer::new(build_ignore_set(&[]).unwrap());
        match analyzer.analyze(fixture.root()).unwrap() {
            AnalysisRecord::TechStack(stack) => stack,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_package_json_react_is_detected() {
        let fixture = ProjectFixture::new();
        fixture.with_package_json(&["react", "pg", "jest"]);

        let stack = analyze(&fixture);

        assert!(stack.frameworks.contains(&"react".to_string()));
        assert_eq!(stack.databases, vec!["postgresql"]);
        assert_eq!(stack.tools, vec!["jest"]);
        assert_eq!(stack.languages, vec!["JavaScript"]);
    }

    #[test]
    fn test_cargo_manifest_and_census() {
        let fixture = ProjectFixture::new();
        fixture
            .with_cargo_toml(&["axum", "sqlx", "serde"])
            .write("src/main.rs", "")
            .write("src/lib.rs", "")
            .write("scripts/setup.py", "")
            .write("Dockerfile", "FROM rust");

        let stack = analyze(&fixture);

        assert_eq!(stack.languages, vec!["Rust", "Python"]);
        assert_eq!(stack.frameworks, vec!["axum"]);
        assert_eq!(stack.databases, vec!["sqlx"]);
        assert!(stack.tools.contains(&"serde".to_string()));
        assert!(stack.tools.contains(&"docker".to_string()));
    }

    #[test]
    fn test_unknown_stack_yields_empty_lists() {
        let fixture = ProjectFixture::new();
        fixture.write("notes.txt", "hello");
        assert!(analyze(&fixture).is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_skipped() {
        let fixture = ProjectFixture::new();
        fixture.write("package.json", "{ not json");

        let stack = analyze(&fixture);

        assert_eq!(stack.languages, vec!["JavaScript"]);
        assert!(stack.frameworks.is_empty());
    }

    #[test]
    fn test_keyword_segments_and_prefixes() {
        assert!(keyword_matches("angular", "@angular/core"));
        assert!(keyword_matches("gin", "github.com/gin-gonic/gin"));
        assert!(keyword_matches(
            "spring-boot*",
            "org.springframework.boot:spring-boot-starter-web"
        ));
        assert!(!keyword_matches("react", "preact"));
    }

    #[test]
    fn test_manifest_parsers() {
        assert_eq!(
            parse_requirements("# deps\nDjango>=4.2\n-r base.txt\nredis==5.0\n").unwrap(),
            vec!["Django", "redis"]
        );
        assert_eq!(
            parse_go_mod("module x\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n)\nrequire github.com/lib/pq v1.10.9\n")
                .unwrap(),
            vec!["github.com/gin-gonic/gin", "github.com/lib/pq"]
        );
        assert_eq!(
            parse_gemfile("source 'https://rubygems.org'\ngem 'rails', '~> 7.0'\ngem \"pg\"\n").unwrap(),
            vec!["rails", "pg"]
        );
        assert_eq!(
            parse_gradle("implementation 'org.springframework.boot:spring-boot-starter-web:3.2.0'")
                .unwrap(),
            vec!["org.springframework.boot:spring-boot-starter-web"]
        );
        let pyproject = "[project]\ndependencies = [\"fastapi>=0.100\", \"sqlalchemy\"]\n";
        assert_eq!(parse_pyproject(pyproject).unwrap(), vec!["fastapi", "sqlalchemy"]);
    }
}
