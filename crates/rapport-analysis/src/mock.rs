// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic placeholder scorer.
//!
//! Only the initiative split and the liking confidence depend on the
//! transcript. Every other number is a fixed constant or a waveform of the
//! timeline rank, not a reading of message content.

use rapport_core::types::{
    AnalysisReport, AnalyzeOptions, Confidence, Highlight, HighlightKind, Language, LikingIndex,
    Message, Metrics, MetricsPair, Speaker, TimelinePoint, Winner, SCORE_MAX,
};

use crate::sampler::{sample, timeline_target};

const RESPONSIVENESS: MetricsPair = MetricsPair { me: 55, partner: 61 };
const WARMTH: MetricsPair = MetricsPair { me: 58, partner: 64 };
const REPAIR: MetricsPair = MetricsPair { me: 46, partner: 52 };
const BALANCE_INDEX: u8 = 57;

/// Message totals at which the liking index confidence steps up.
const HIGH_CONFIDENCE_MESSAGES: usize = 200;
const MEDIUM_CONFIDENCE_MESSAGES: usize = 40;

/// Scores a transcript without consulting any external engine.
pub fn score(messages: &[Message], options: &AnalyzeOptions) -> AnalysisReport {
    let lang = options.language;

    let metrics = options.want_metrics.then(|| Metrics {
        initiative: initiative(messages),
        responsiveness: RESPONSIVENESS,
        warmth: WARMTH,
        repair: REPAIR,
        balance_index: BALANCE_INDEX,
    });

    let highlights = match (options.want_highlights, messages.first(), messages.last()) {
        (true, Some(first), Some(last)) => vec![
            Highlight {
                kind: HighlightKind::Green,
                message_id: first.id.clone(),
                reason: text(lang, Text::OpeningHighlight).to_string(),
            },
            Highlight {
                kind: HighlightKind::Red,
                message_id: last.id.clone(),
                reason: text(lang, Text::ClosingHighlight).to_string(),
            },
        ],
        _ => Vec::new(),
    };

    AnalysisReport {
        summary: text(lang, Text::Summary).to_string(),
        confidence: Confidence::Medium,
        metrics,
        highlights,
        liking_index: Some(liking_index(messages.len(), lang)),
        timeline_points: timeline(messages),
    }
}

/// Percentage split of message counts, `partner = 100 - me`.
fn initiative(messages: &[Message]) -> MetricsPair {
    let total = messages.len();
    if total == 0 {
        return MetricsPair { me: 50, partner: 50 };
    }
    let mine = messages.iter().filter(|m| m.speaker == Speaker::Me).count();
    let me = (100.0 * mine as f64 / total as f64).round_ties_even() as u8;
    MetricsPair {
        me,
        partner: SCORE_MAX - me,
    }
}

fn liking_index(total: usize, lang: Language) -> LikingIndex {
    let me = i32::from(WARMTH.me) + i32::from(RESPONSIVENESS.me);
    let partner = i32::from(WARMTH.partner) + i32::from(RESPONSIVENESS.partner);
    let delta = (0.25 * f64::from(me - partner)).round_ties_even() as i32;
    let score = (50 + delta).clamp(0, i32::from(SCORE_MAX)) as u8;

    let confidence = if total >= HIGH_CONFIDENCE_MESSAGES {
        Confidence::High
    } else if total >= MEDIUM_CONFIDENCE_MESSAGES {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    LikingIndex {
        score,
        winner: Winner::from_score(score),
        rationale: text(lang, Text::LikingRationale).to_string(),
        confidence,
    }
}

fn timeline(messages: &[Message]) -> Vec<TimelinePoint> {
    let n = messages.len();
    sample(n, timeline_target(n))
        .into_iter()
        .enumerate()
        .map(|(rank, index)| {
            let m = &messages[index];
            let (mood, tension, repair) = waveform(rank, m.speaker);
            TimelinePoint {
                message_id: m.id.clone(),
                sequence_index: rank as u32,
                speaker: m.speaker,
                mood,
                tension,
                repair,
            }
        })
        .collect()
}

/// Oscillating placeholder signal for the `rank`-th timeline point.
fn waveform(rank: usize, speaker: Speaker) -> (u8, u8, u8) {
    let k = rank as i32;
    let lean = match speaker {
        Speaker::Me => 1,
        Speaker::Partner => -1,
    };

    let mood = 55 + (k % 7) * 4 - (k % 3) * 5 + 3 * lean;
    let tension = 30 + (k % 5) * 6 - (k % 2) * 4 - 2 * lean;
    let repair = 45 + (k % 11) * 3 - (k % 4) * 5 + 2 * lean;

    (clamp_score(mood), clamp_score(tension), clamp_score(repair))
}

fn clamp_score(v: i32) -> u8 {
    v.clamp(0, i32::from(SCORE_MAX)) as u8
}

#[derive(Clone, Copy)]
enum Text {
    Summary,
    OpeningHighlight,
    ClosingHighlight,
    LikingRationale,
}

fn text(lang: Language, which: Text) -> &'static str {
    match (lang, which) {
        (Language::Ko, Text::Summary) => {
            "전반적으로 대화는 안정적이지만, 특정 구간에서 오해 소지가 있는 표현이 관측됨."
        }
        (Language::En, Text::Summary) => {
            "The conversation is stable overall, but some passages contain wording that could be misread."
        }
        (Language::Ko, Text::OpeningHighlight) => "대화를 시작하며 상황을 공유함",
        (Language::En, Text::OpeningHighlight) => "Opens the conversation by sharing context",
        (Language::Ko, Text::ClosingHighlight) => "마지막 표현이 차갑게 느껴질 수 있음",
        (Language::En, Text::ClosingHighlight) => "The closing remark may come across as cold",
        (Language::Ko, Text::LikingRationale) => {
            "따뜻함과 반응성 점수 차이를 기준으로 산출한 참고용 지표"
        }
        (Language::En, Text::LikingRationale) => {
            "Reference indicator derived from the warmth and responsiveness gap"
        }
    }
}
