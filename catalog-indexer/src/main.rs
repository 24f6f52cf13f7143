use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Arg, ArgAction, Command};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use feed_filter::builder::CatalogBuilder;
use feed_filter::CatalogError;

/// 输出文件名
const BUNDLE_FILE: &str = "catalog.bin";
const INDEX_FILE: &str = "category_index.json";

#[derive(Debug, Error)]
enum IndexerError {
    #[error("源路径不存在: {0}")]
    MissingSource(PathBuf),

    #[error("在 {0} 中没有找到目录 JSON 文件")]
    NoCatalogFiles(PathBuf),

    #[error("遍历目录时出错: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("读写文件 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("目录文件 {path} 无效: {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// 一次生成的统计
#[derive(Debug)]
struct BundleSummary {
    files: usize,
    records: usize,
    bundle_path: PathBuf,
    index_path: PathBuf,
}

fn main() {
    let matches = Command::new("订阅源目录生成器")
        .version(env!("CARGO_PKG_VERSION"))
        .about("把订阅源目录 JSON 打包为筛选模块使用的 bundle")
        .arg(Arg::new("source")
            .short('s')
            .long("source")
            .value_name("SOURCE")
            .help("目录 JSON 文件或所在目录")
            .required(true))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUTPUT_DIR")
            .help("bundle 输出目录")
            .required(true))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
        .get_matches();

    let verbose = matches.get_flag("verbose");
    init_tracing(verbose);

    // 两个参数都是 required，clap 保证存在
    let source = matches.get_one::<String>("source").map(PathBuf::from).unwrap_or_default();
    let output = matches.get_one::<String>("output").map(PathBuf::from).unwrap_or_default();

    let start_time = Instant::now();
    match generate_bundle(&source, &output) {
        Ok(summary) => {
            println!(
                "目录生成成功！{} 个文件，{} 个订阅源，耗时 {:.2} 秒",
                summary.files,
                summary.records,
                start_time.elapsed().as_secs_f32()
            );
            println!("bundle: {}", summary.bundle_path.display());
            println!("分类索引: {}", summary.index_path.display());
        }
        Err(e) => {
            eprintln!("错误: 目录生成失败: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// 收集目录 JSON 文件，按路径排序
fn collect_catalog_files(source: &Path) -> Result<Vec<PathBuf>, IndexerError> {
    if !source.exists() {
        return Err(IndexerError::MissingSource(source.to_path_buf()));
    }
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(IndexerError::NoCatalogFiles(source.to_path_buf()));
    }
    Ok(files)
}

/// 读取全部目录文件，写出 bundle 和分类索引
fn generate_bundle(source: &Path, output: &Path) -> Result<BundleSummary, IndexerError> {
    let files = collect_catalog_files(source)?;
    info!("找到 {} 个目录文件", files.len());

    let mut builder = CatalogBuilder::new();
    for path in &files {
        let json = fs::read_to_string(path).map_err(|source| IndexerError::Io {
            path: path.clone(),
            source,
        })?;
        let count = builder.add_json(&json).map_err(|source| IndexerError::InvalidFile {
            path: path.clone(),
            source,
        })?;
        debug!("读取 {}: {} 个订阅源", path.display(), count);
    }

    info!("共收集 {} 个订阅源", builder.record_count());

    fs::create_dir_all(output).map_err(|source| IndexerError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    let bundle_path = output.join(BUNDLE_FILE);
    let index_path = output.join(INDEX_FILE);
    let catalog = builder.save(&bundle_path, &index_path)?;

    Ok(BundleSummary {
        files: files.len(),
        records: catalog.len(),
        bundle_path,
        index_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_filter::{Catalog, CategoryIndex};

    const TECH: &str = r#"[
        {"id": "rust", "title": "Rust Blog", "url": "https://blog.rust-lang.org/feed.xml", "type": "Blog",
         "domain": ["Technology"], "subdomain": ["Software"], "area": ["Languages"], "topic": ["Rust"],
         "tags": ["rust"], "rating": 5}
    ]"#;
    const SCIENCE: &str = r#"[
        {"id": "nasa", "title": "NASA Breaking News", "url": "https://www.nasa.gov/rss", "type": "News",
         "domain": ["Science"], "subdomain": ["Space"], "area": ["Agencies"], "topic": ["NASA"]}
    ]"#;

    #[test]
    fn builds_bundle_and_index_from_a_directory() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("nested")).unwrap();
        fs::write(src.path().join("a_tech.json"), TECH).unwrap();
        fs::write(src.path().join("nested").join("science.json"), SCIENCE).unwrap();
        fs::write(src.path().join("README.md"), "ignored").unwrap();
        let out = tempfile::tempdir().unwrap();

        let summary = generate_bundle(src.path(), &out.path().join("dist")).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.records, 2);

        let catalog = Catalog::from_bundle(&fs::read(&summary.bundle_path).unwrap()).unwrap();
        assert_eq!(catalog.records()[0].id, "rust");
        assert_eq!(catalog.records()[1].id, "nasa");

        let index: CategoryIndex =
            serde_json::from_str(&fs::read_to_string(&summary.index_path).unwrap()).unwrap();
        assert_eq!(index.topics("Science", "Space", "Agencies"), ["NASA"]);
    }

    #[test]
    fn single_file_source_is_accepted() {
        let src = tempfile::tempdir().unwrap();
        let file = src.path().join("catalog.json");
        fs::write(&file, TECH).unwrap();
        let out = tempfile::tempdir().unwrap();

        let summary = generate_bundle(&file, out.path()).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn invalid_file_is_reported_with_its_path() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("broken.json"), "[{\"id\": 1}]").unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = generate_bundle(src.path(), out.path()).unwrap_err();
        assert!(matches!(err, IndexerError::InvalidFile { ref path, .. } if path.ends_with("broken.json")));
    }

    #[test]
    fn empty_or_missing_sources_fail() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        assert!(matches!(
            generate_bundle(src.path(), out.path()),
            Err(IndexerError::NoCatalogFiles(_))
        ));
        assert!(matches!(
            generate_bundle(&src.path().join("missing"), out.path()),
            Err(IndexerError::MissingSource(_))
        ));
    }
}
