use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::runner::Phase;
use crate::util::format_time;
use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;

pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Setup => render_setup(app, f, f.area()),
        AppState::Running => render_running(app, f, f.area()),
        AppState::Finished => render_finished(app, f, f.area()),
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn render_setup(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(2)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(6),
                Constraint::Length(2),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new(Span::styled(
        "shingi ・ 真偽判断タスク",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let mut rows: Vec<Line> = Vec::new();
    for (idx, task) in app.task_sets.iter().enumerate() {
        let dataset = app.dataset_for(task);
        let dataset_label = dataset
            .map(|set| format!("{}（{} 文）", set.name, set.sentences.len()))
            .unwrap_or_else(|| "（参照先なし）".to_string());
        let label = format!("{}  {}", task.name, dataset_label);
        if idx == app.selected {
            rows.push(Line::from(Span::styled(
                format!("> {label}"),
                bold().fg(Color::Green),
            )));
        } else {
            rows.push(Line::from(Span::styled(format!("  {label}"), dim_bold())));
        }
    }
    if rows.is_empty() {
        rows.push(Line::from(Span::styled(
            "タスクセットがまだ存在しません。",
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(rows), chunks[1]);

    if let Some(task) = app.selected_task() {
        let dataset = app.dataset_for(task);
        let sentence_count = dataset.map_or(0, |set| set.sentences.len());
        let question_count = task.question_count.unwrap_or(sentence_count);
        let order = if task.randomize {
            "ランダム抽出"
        } else {
            "順番通り"
        };
        let limit = if task.enable_time_limit {
            format!(
                "{} 秒 / タイマー{}",
                task.duration_sec,
                if task.show_timer { "表示" } else { "非表示" }
            )
        } else {
            "制限なし".to_string()
        };

        let mut lines = vec![
            Line::from(format!("出題数：{question_count} 問（{order}）")),
            Line::from(format!("制限時間：{limit}")),
            Line::from(format!(
                "キー設定：{} = 本当 / {} = うそ",
                app.preferences.true_key.to_ascii_uppercase(),
                app.preferences.false_key.to_ascii_uppercase()
            )),
        ];
        if !task.notes.is_empty() {
            lines.push(Line::from(format!("メモ：{}", task.notes)));
        }
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[2]);
    }

    if let Some(status) = &app.status {
        let status_line = Paragraph::new(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        ))
        .alignment(Alignment::Center);
        f.render_widget(status_line, chunks[3]);
    }

    let hints = Paragraph::new(Span::styled(
        "↑/↓ 選択  enter 開始  esc 終了",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hints, chunks[4]);
}

fn render_running(app: &App, f: &mut Frame, area: Rect) {
    let runner = &app.runner;
    let sentence = runner.current_sentence();
    let text = sentence.map(|s| s.text.as_str()).unwrap_or_default();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let sentence_lines = ((text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    ((area.height.saturating_sub(sentence_lines)) as f64 / 2.0) as u16,
                ),
                Constraint::Length(2),
                Constraint::Length(sentence_lines),
                Constraint::Length(2),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    let phase_dot = Paragraph::new(Span::styled(
        format!("● {}", runner.phase()),
        Style::default().add_modifier(Modifier::DIM),
    ));
    f.render_widget(phase_dot, chunks[0]);

    let show_timer = app
        .active_task
        .as_ref()
        .is_some_and(|task| task.enable_time_limit && task.show_timer);

    if runner.phase() == Phase::TimeUpPending {
        let banner = Paragraph::new(Span::styled(
            "時間切れです。この文に回答すると終了します",
            bold().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center);
        f.render_widget(banner, chunks[1]);
    } else if show_timer {
        if let Some(remaining) = runner.remaining_secs() {
            let timer = Paragraph::new(Span::styled(format_time(remaining), dim_bold()))
                .alignment(Alignment::Center);
            f.render_widget(timer, chunks[1]);
        }
    }

    let sentence_widget = Paragraph::new(Span::styled(text.to_string(), bold()))
        .alignment(if sentence_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    f.render_widget(sentence_widget, chunks[2]);

    let show_count = app
        .active_task
        .as_ref()
        .is_some_and(|task| task.show_question_count);
    if show_count {
        let (current, total) = runner.trial_position();
        let counter = Paragraph::new(Span::styled(format!("{current} / {total}"), dim_bold()))
            .alignment(Alignment::Center);
        f.render_widget(counter, chunks[3]);
    }

    let hints = Paragraph::new(Span::styled(
        format!(
            "{} = 本当だと思う   {} = うそだと思う   esc 中断",
            app.preferences.true_key.to_ascii_uppercase(),
            app.preferences.false_key.to_ascii_uppercase()
        ),
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hints, chunks[4]);
}

fn render_finished(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(2)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(6),
                Constraint::Length(2),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new(Span::styled("おつかれさまでした", bold().fg(Color::Green)))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(summary) = &app.summary {
        lines.push(Line::from(format!(
            "正答：{} / {}（{}%）",
            summary.correct, summary.total, summary.accuracy_pct
        )));
        if let Some(mean_rt) = summary.mean_rt_ms {
            let sd = summary.sd_rt_ms.unwrap_or(0.0);
            lines.push(Line::from(format!(
                "平均回答時間：{:.0} ms（SD {:.0} ms）",
                mean_rt, sd
            )));
        }
        if !summary.per_tag.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("タグ別正答", dim_bold())));
            for (tag, correct, total) in &summary.per_tag {
                lines.push(Line::from(format!("  {tag}：{correct} / {total}")));
            }
        }
    }
    if let Some(path) = &app.last_saved {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("保存先：{}", path.display()),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);

    let hints = Paragraph::new(Span::styled(
        "(r) 同じタスクをもう一度  (n) タスク選択へ  (esc) 終了",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hints, chunks[3]);
}
