//! Japanese titles and honorifics kept outside PERSON tokens
//!
//! Recognizers often include the title in a name span (`山田部長`,
//! `佐藤さん`). Keeping the title visible preserves the tone of the text
//! while the name itself is still tokenized: `山田部長` becomes
//! `<<token>>部長`.

use crate::anonymization::models::{Category, Span};
use crate::anonymization::text::CharIndex;

/// Titles and honorifics, longest first so compound titles win
const TITLES: &[&str] = &[
    "プロジェクトマネージャー",
    "プロダクトマネージャー",
    "プロジェクトリーダー",
    "グループリーダー",
    "スクラムマスター",
    "テクニカルリード",
    "チームリーダー",
    "コンサルタント",
    "マネージャー",
    "アーキテクト",
    "プログラマー",
    "エンジニア",
    "デザイナー",
    "代表取締役",
    "リーダー",
    "執行役員",
    "事業部長",
    "営業部長",
    "技術部長",
    "開発部長",
    "総務部長",
    "人事部長",
    "司法書士",
    "取締役",
    "副社長",
    "本部長",
    "支店長",
    "監査役",
    "准教授",
    "研究員",
    "会計士",
    "弁護士",
    "税理士",
    "看護師",
    "薬剤師",
    "部長",
    "課長",
    "係長",
    "主任",
    "社長",
    "専務",
    "常務",
    "理事",
    "教授",
    "講師",
    "助教",
    "博士",
    "先生",
    "教諭",
    "医師",
    "先輩",
    "さん",
    "くん",
    "ちゃん",
    "CEO",
    "CTO",
    "CFO",
    "COO",
    "様",
    "氏",
    "君",
    "殿",
];

/// Number of trailing characters of `name` that form a title
///
/// Whitespace around the title (`山田 部長`) counts as part of it, so the
/// remaining name is the same string with or without the title. Returns 0
/// when there is no title or when the whole string is a title.
pub fn title_suffix_len(name: &str) -> usize {
    let trimmed = name.trim_end();
    for title in TITLES {
        if let Some(stem) = trimmed.strip_suffix(title) {
            let name_part = stem.trim_end();
            if name_part.trim_start().is_empty() {
                return 0;
            }
            return name.chars().count() - name_part.chars().count();
        }
    }
    0
}

/// Shrinks PERSON spans so a trailing title stays in the text
///
/// Spans only ever shrink, so a non-overlapping cover stays non-overlapping.
pub fn split_title_suffixes(spans: &mut [Span], text: &str, chars: &CharIndex) {
    for span in spans.iter_mut().filter(|s| s.label == Category::Person) {
        let Some(covered) = span.slice(text, chars) else {
            continue;
        };
        let strip = title_suffix_len(covered);
        if strip > 0 && strip < span.len() {
            span.end -= strip;
        }
    }
}
