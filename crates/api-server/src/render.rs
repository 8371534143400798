//! HTML views for the meeting page
//!
//! Every interpolated value goes through `escape_html`, or `js_string` when
//! it lands inside a script.

use meetgate_core::access::{AccessError, MeetingPage};

const BASE_STYLE: &str = "\
body { font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #f5f5f5; margin: 0; }
.card { max-width: 600px; margin: 0 auto; background: white; padding: 40px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
.title { color: #333; margin-bottom: 20px; }
.error-title { color: #d63638; margin-bottom: 20px; font-size: 24px; }
.message { color: #666; font-size: 16px; line-height: 1.5; margin-bottom: 30px; }
.button { display: inline-block; padding: 12px 24px; background: #0073aa; color: white; text-decoration: none; border: 0; border-radius: 4px; margin: 0 10px; cursor: pointer; }
.button:hover { background: #005a87; }
.code { font-size: 12px; color: #999; margin-top: 20px; }
.countdown { font-size: 24px; color: #0073aa; margin: 20px 0; }
.info { background: #f9f9f9; padding: 20px; border-radius: 5px; margin: 20px 0; }
.testing-mode { background: #fff3cd; border: 1px solid #ffeaa7; color: #856404; }";

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON string literal that is safe inside `<script>`
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn document(title: &str, lang: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{style}</style>\n{head}</head>\n<body>\n{body}\n</body>\n</html>\n",
        lang = escape_html(lang),
        title = escape_html(title),
        style = BASE_STYLE,
        head = head,
        body = body,
    )
}

pub fn error_page(err: &AccessError, home_url: &str) -> String {
    let body = format!(
        "<div class=\"card\">\n\
         <h1 class=\"error-title\">{title}</h1>\n\
         <div class=\"message\"><p>{message}</p></div>\n\
         <div class=\"actions\">\
         <a href=\"{home}\" class=\"button\">Go to Homepage</a>\
         <a href=\"javascript:history.back()\" class=\"button\">Go Back</a>\
         </div>\n\
         <div class=\"code\">Error Code: {code}</div>\n\
         </div>",
        title = escape_html(err.title()),
        message = escape_html(&err.to_string()),
        home = escape_html(home_url),
        code = escape_html(err.code()),
    );
    document(err.title(), "en", "", &body)
}

pub fn waiting_page(page: &MeetingPage) -> String {
    let notice = if page.testing_mode {
        "<div class=\"info testing-mode\"><p>TESTING MODE: Meeting access restrictions have been bypassed. You can join immediately.</p></div>"
    } else {
        "<div class=\"info\"><p>Please keep this page open. It will refresh when the meeting room opens.</p></div>"
    };
    let body = format!(
        "<div class=\"card\">\n\
         <h1 class=\"title\">{title}</h1>\n\
         <p>Your meeting will start at:</p>\n\
         <div class=\"countdown\"><time datetime=\"{start_iso}\">{start}</time></div>\n\
         <p>The room opens in <strong id=\"countdown\">{remaining}</strong>.</p>\n\
         {notice}\n\
         <button onclick=\"location.reload()\" class=\"button\">Refresh Page</button>\n\
         </div>\n\
         <script>\n\
         (function () {{\n\
           var remaining = {seconds};\n\
           var el = document.getElementById('countdown');\n\
           function fmt(s) {{\n\
             var h = Math.floor(s / 3600), m = Math.floor((s % 3600) / 60), r = s % 60;\n\
             return (h > 0 ? h + 'h ' : '') + m + 'm ' + r + 's';\n\
           }}\n\
           var timer = setInterval(function () {{\n\
             remaining -= 1;\n\
             if (remaining <= 0) {{ clearInterval(timer); location.reload(); return; }}\n\
             el.textContent = fmt(remaining);\n\
           }}, 1000);\n\
         }})();\n\
         </script>",
        title = escape_html(page.booking.title()),
        start_iso = page.window.start.to_rfc3339(),
        start = page.window.start.format("%Y-%m-%d %H:%M UTC"),
        remaining = format_duration(page.seconds_until_open),
        notice = notice,
        seconds = page.seconds_until_open,
    );
    document(page.booking.title(), &page.language, "", &body)
}

pub fn ended_page(page: &MeetingPage) -> String {
    let body = format!(
        "<div class=\"card\">\n\
         <h1 class=\"title\">{title}</h1>\n\
         <div class=\"message\"><p>This meeting has ended.</p><p>Thank you for participating!</p></div>\n\
         </div>",
        title = escape_html(page.booking.title()),
    );
    document(page.booking.title(), &page.language, "", &body)
}

/// Embedded Jitsi room. Hosts get the moderator toolbar.
pub fn live_page(page: &MeetingPage) -> String {
    let toolbar = if page.role.is_moderator() {
        "['microphone','camera','desktop','chat','raisehand','participants-pane','tileview','settings','mute-everyone','security','recording','hangup']"
    } else {
        "['microphone','camera','desktop','chat','raisehand','participants-pane','tileview','settings','hangup']"
    };
    let head = format!(
        "<script src=\"https://{}/external_api.js\"></script>\n\
         <style>body {{ padding: 0; background: #111; }} #meet {{ position: fixed; inset: 0; }}</style>\n",
        escape_html(&page.domain)
    );
    let body = format!(
        "<div id=\"meet\"></div>\n\
         <script>\n\
         (function () {{\n\
           if (typeof JitsiMeetExternalAPI === 'undefined') {{\n\
             document.getElementById('meet').innerHTML = '<div class=\"card\"><p class=\"message\">The video service could not be loaded. Please refresh the page.</p></div>';\n\
             return;\n\
           }}\n\
           var api = new JitsiMeetExternalAPI({domain}, {{\n\
             roomName: {room},\n\
             parentNode: document.getElementById('meet'),\n\
             width: '100%',\n\
             height: '100%',\n\
             lang: {lang},\n\
             userInfo: {{ displayName: {name} }},\n\
             configOverwrite: {{ defaultLanguage: {lang}, prejoinPageEnabled: false, startWithAudioMuted: {muted} }},\n\
             interfaceConfigOverwrite: {{ TOOLBAR_BUTTONS: {toolbar}, SETTINGS_SECTIONS: ['devices', 'language', 'moderator', 'profile', 'calendar'] }}\n\
           }});\n\
           var meetingEnd = {end_ms};\n\
           setInterval(function () {{\n\
             if (Date.now() > meetingEnd) {{ api.executeCommand('hangup'); location.reload(); }}\n\
           }}, 30000);\n\
         }})();\n\
         </script>",
        domain = js_string(&page.domain),
        room = js_string(&page.room_path),
        lang = js_string(&page.language),
        name = js_string(&page.display_name),
        muted = !page.role.is_moderator(),
        toolbar = toolbar,
        end_ms = if page.testing_mode {
            i64::MAX / 2
        } else {
            page.window.end.timestamp_millis()
        },
    );
    document(page.booking.title(), &page.language, &head, &body)
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, rest) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, rest)
    } else {
        format!("{}m {}s", minutes, rest)
    }
}
