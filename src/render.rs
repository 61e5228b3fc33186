//! Markdown body of a Blinko note.
use crate::model::{Attachment, Record};

/// Render a post as Markdown: heading, body, metadata bullets, then media links.
pub fn note_content(record: &Record, attachments: &[Attachment]) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# {}", record.posted_at.format("%Y-%m-%d %H:%M:%S")));

    if !record.text.is_empty() {
        lines.push(String::new());
        lines.push(record.text.clone());
    }

    lines.push(String::new());
    lines.push("---".into());

    let fields = [
        ("微博ID", &record.id),
        ("话题", &record.topic),
        ("@用户", &record.mentions),
        ("位置", &record.location),
        ("工具", &record.tool),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            lines.push(format!("- {label}: {value}"));
        }
    }

    if !(record.likes.is_empty() && record.comments.is_empty() && record.reposts.is_empty()) {
        lines.push(format!(
            "- 互动: 赞 {} | 评论 {} | 转发 {}",
            record.likes, record.comments, record.reposts
        ));
    }

    if !attachments.is_empty() {
        lines.push(String::new());
        for att in attachments {
            if att.is_image() {
                lines.push(format!("![]({})", att.path));
            } else {
                lines.push(format!("[视频]({})", att.path));
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_date;

    fn record() -> Record {
        Record {
            posted_at: parse_date("2023-01-01 10:00:00").unwrap(),
            id: "111".into(),
            text: "hello".into(),
            topic: String::new(),
            mentions: String::new(),
            location: String::new(),
            tool: String::new(),
            likes: String::new(),
            comments: String::new(),
            reposts: String::new(),
        }
    }

    fn attachment(name: &str, mime: &str) -> Attachment {
        Attachment {
            id: 1,
            is_share: false,
            share_password: String::new(),
            name: name.into(),
            path: format!("/api/file/{name}"),
            size: "1".into(),
            mime: mime.into(),
            note_id: 1,
            account_id: 1.into(),
            sort_order: 0,
            created_at: String::new(),
            updated_at: String::new(),
            prefix_path: String::new(),
            depth: 0,
            metadata: None,
        }
    }

    #[test]
    fn minimal_note() {
        let out = note_content(&record(), &[]);
        assert_eq!(out, "# 2023-01-01 10:00:00\n\nhello\n\n---\n- 微博ID: 111\n");
    }

    #[test]
    fn empty_body_and_all_metadata() {
        let mut r = record();
        r.text.clear();
        r.topic = "#话题#".into();
        r.mentions = "@a @b".into();
        r.location = "北京".into();
        r.tool = "iPhone".into();
        r.likes = "5".into();
        let out = note_content(&r, &[]);
        assert_eq!(
            out,
            "# 2023-01-01 10:00:00\n\n---\n\
             - 微博ID: 111\n\
             - 话题: #话题#\n\
             - @用户: @a @b\n\
             - 位置: 北京\n\
             - 工具: iPhone\n\
             - 互动: 赞 5 | 评论  | 转发 \n"
        );
    }

    #[test]
    fn media_lines_follow_content_type() {
        let atts = [
            attachment("a.jpg", "image/jpeg"),
            attachment("b.mp4", "video/mp4"),
            attachment("c.bin", "application/octet-stream"),
        ];
        let out = note_content(&record(), &atts);
        assert!(out.ends_with(
            "- 微博ID: 111\n\n![](/api/file/a.jpg)\n[视频](/api/file/b.mp4)\n[视频](/api/file/c.bin)\n"
        ));
    }
}
