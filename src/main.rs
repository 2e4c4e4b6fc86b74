use anyhow::{bail, Context};
use clap::Parser;
use image_matcher_common::{
    extract_headings, filter_headings, find_matches, find_matches_with, score_image, scoring_keywords,
    CandidateImage, KeywordRanker, MatchGroup, MatchMode, MatchOptions,
};
use image_matcher_rust::{bulk, cli, config, error, logging, ranker, review, scanner};
use cli::{Cli, Commands, MatchArgs, MediaArgs};
use config::Config;
use ranker::{AiRanker, AiSettings, CliRunner, ResponseCache, UsageLog};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut config = Config::load()?;
    if let Some(provider) = cli.ai_provider {
        config.ai_provider = provider;
    }

    match cli.command {
        Commands::Match { document, media, overrides, output, cache_dir } => {
            println!("🖼  image-matcher - 見出しと画像の照合\n");

            let options = resolve_options(&config, &overrides)?;

            // 1. 候補画像
            println!("[1/3] 候補画像を読み込み中...");
            let candidates = load_candidates(&media)?;
            println!("✔ {}枚の候補画像\n", candidates.len());

            // 2. 照合
            println!("[2/3] 照合中... (方式: {})", options.mode);
            let markup = std::fs::read_to_string(&document)
                .with_context(|| format!("文書を読み込めません: {}", document.display()))?;

            let groups = match options.mode {
                MatchMode::Keyword => find_matches(&markup, &candidates, &options)?,
                MatchMode::Ai => {
                    let cache_dir = cache_dir.unwrap_or_else(|| parent_dir(&document));
                    let ai = build_ai_ranker(&config, &options, &cache_dir)?;
                    let result = find_matches_with(&markup, &candidates, &options, &ai);
                    save_ai_state(ai, &cache_dir)?;
                    result?
                }
            };
            println!("✔ 照合完了\n");
            print_groups(&groups);

            // 3. 結果保存
            if let Some(output) = output {
                println!("\n[3/3] 結果を保存中...");
                let json = serde_json::to_string_pretty(&groups)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            println!("\n✅ 照合完了");
        }

        Commands::Headings { document, hierarchy, overlap } => {
            let overrides = MatchArgs {
                hierarchy,
                overlap,
                ..MatchArgs::default()
            };
            let options = resolve_options(&config, &overrides)?;

            let markup = std::fs::read_to_string(&document)
                .with_context(|| format!("文書を読み込めません: {}", document.display()))?;
            let all = extract_headings(&markup);
            let kept = filter_headings(
                &all,
                options.hierarchy_mode,
                options.overlap_threshold,
                options.normalize,
            );
            let kept_positions: HashSet<usize> = kept.iter().map(|h| h.position).collect();

            println!(
                "見出し: {}件（照合対象 {}件, 階層モード: {}）",
                all.len(),
                kept.len(),
                options.hierarchy_mode
            );
            for heading in &all {
                let mark = if kept_positions.contains(&heading.position) { "✔" } else { "-" };
                println!("  {} <{}> {}", mark, heading.tag, heading.text);
            }
        }

        Commands::Score { heading, filename, title, alt } => {
            let options = config.to_match_options()?;
            let keywords = scoring_keywords(&heading, options.normalize);
            let image = CandidateImage::new(filename.as_str(), filename.as_str())
                .with_title(title)
                .with_alt(alt);
            let result = score_image(&keywords, &image, &options.scoring);

            println!("キーワード: {:?}", keywords);
            println!("スコア: {}", result.score);
            if !result.matched_fields.is_empty() {
                let fields: Vec<String> = result.matched_fields.iter().map(|f| f.to_string()).collect();
                println!("一致フィールド: {}", fields.join(", "));
            }
        }

        Commands::Bulk { folder, media, overrides, output, recursive } => {
            println!("🚀 image-matcher - 一括照合\n");

            let options = resolve_options(&config, &overrides)?;

            // 1. Scan
            println!("[1/3] 文書をスキャン中...");
            let documents = scanner::scan_documents(&folder, recursive)?;
            if documents.is_empty() {
                return Err(error::MatcherError::NoDocumentsFound(folder.display().to_string()).into());
            }
            let candidates = load_candidates(&media)?;
            println!("✔ {}件の文書, {}枚の候補画像\n", documents.len(), candidates.len());

            // 2. Match
            println!("[2/3] 照合中... (方式: {})", options.mode);
            let report = match options.mode {
                MatchMode::Keyword => {
                    let keyword = KeywordRanker::new(options.scoring.clone());
                    bulk::process_documents(&documents, &candidates, &options, &keyword, true)
                }
                MatchMode::Ai => {
                    let ai = build_ai_ranker(&config, &options, &folder)?;
                    let report = bulk::process_documents(&documents, &candidates, &options, &ai, true);
                    save_ai_state(ai, &folder)?;
                    report
                }
            };
            println!(
                "✔ 完了 {}件 / 失敗 {}件 / マッチした見出し {}件\n",
                report.completed,
                report.failed,
                report.matched_headings()
            );

            // 3. Report
            println!("[3/3] レポートを保存中...");
            let output = output.unwrap_or_else(|| folder.join("bulk-report.json"));
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(&output, json)?;
            println!("✔ レポートを保存: {}", output.display());

            println!("\n✅ 一括照合完了");
        }

        Commands::Review { input, output } => {
            println!("📝 image-matcher - レビュー\n");
            review::run_interactive_review(&input, &output)?;
        }

        Commands::Config { show, set_mode, set_threshold, set_hierarchy, set_overlap } => {
            let mut changed = false;

            if let Some(mode) = set_mode {
                config.match_mode = mode;
                println!("✔ 照合方式を設定しました: {}", mode);
                changed = true;
            }
            if let Some(threshold) = set_threshold {
                config.set_threshold(threshold)?;
                println!("✔ 信頼度しきい値を設定しました: {}", threshold);
                changed = true;
            }
            if let Some(hierarchy) = set_hierarchy {
                config.hierarchy_mode = hierarchy;
                println!("✔ 見出し階層モードを設定しました: {}", hierarchy);
                changed = true;
            }
            if let Some(overlap) = set_overlap {
                config.set_overlap(overlap)?;
                println!("✔ 重複率しきい値を設定しました: {}", overlap);
                changed = true;
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  照合方式: {}", config.match_mode);
                println!("  信頼度しきい値: {}", config.confidence_threshold);
                println!("  見出し階層モード: {}", config.hierarchy_mode);
                println!("  重複率しきい値: {}", config.heading_overlap_threshold);
                println!("  語幹処理: {}", on_off(config.enable_stemming));
                println!("  綴り揺れ: {}", on_off(config.enable_spelling_variants));
                println!("  AIプロバイダ: {} ({})", config.ai_provider.command_name(), config.model);
                println!("  AI候補数: {}", config.ai_candidate_count);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  キーワード代替: {}", on_off(config.auto_fallback_keyword));
                println!(
                    "  API上限: {}回/時, {}回/日",
                    config.max_api_calls_per_hour, config.max_api_calls_per_day
                );
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = ResponseCache::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = ResponseCache::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }

                if let Ok(path) = UsageLog::default_path() {
                    let usage = UsageLog::load(&path);
                    let now = chrono::Utc::now();
                    println!(
                        "  API使用量: 直近1時間 {}回, 直近24時間 {}回",
                        usage.calls_in_last_hour(now),
                        usage.calls_in_last_day(now)
                    );
                }
            }

            if clear {
                match ResponseCache::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// 設定ファイルの値にコマンドライン指定を重ねる
fn resolve_options(config: &Config, overrides: &MatchArgs) -> anyhow::Result<MatchOptions> {
    let mut options = config.to_match_options()?;
    overrides.apply(&mut options);
    options.validate()?;
    Ok(options)
}

fn load_candidates(media: &MediaArgs) -> anyhow::Result<Vec<CandidateImage>> {
    let candidates = match (&media.media, &media.media_dir) {
        (Some(file), _) => scanner::load_media_file(file)?,
        (None, Some(dir)) => scanner::scan_media_dir(dir)?,
        (None, None) => bail!("--media または --media-dir を指定してください"),
    };
    Ok(candidates)
}

fn build_ai_ranker(
    config: &Config,
    options: &MatchOptions,
    cache_dir: &Path,
) -> anyhow::Result<AiRanker<CliRunner>> {
    let runner = CliRunner::new(
        config.ai_provider,
        config.model.clone(),
        Duration::from_secs(config.timeout_seconds),
    )?;
    let usage = UsageLog::load(&UsageLog::default_path()?);

    Ok(AiRanker::new(
        runner,
        options.clone(),
        AiSettings::from_config(config),
        ResponseCache::load(cache_dir),
        usage,
    ))
}

fn save_ai_state(ai: AiRanker<CliRunner>, cache_dir: &Path) -> anyhow::Result<()> {
    let (cache, usage) = ai.into_state();
    cache.save(cache_dir)?;
    usage.save(&UsageLog::default_path()?)?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_groups(groups: &[MatchGroup]) {
    for group in groups {
        match group.best() {
            Some(best) => println!(
                "  <{}> {} → {} (信頼度 {}, 候補 {}件)",
                group.heading.tag,
                group.heading.text,
                best.filename,
                best.confidence_score,
                group.matches.len()
            ),
            None => println!("  <{}> {} → マッチなし", group.heading.tag, group.heading.text),
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "有効" } else { "無効" }
}
