use promo_auth::AccountSummary;

use super::session_store::Flash;

const INDEX_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Promo Poster</title>
    <style>
        body {
            margin: 0;
            padding: 32px 16px;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #F3F4F6;
            color: #1F2937;
        }
        .container {
            background: white;
            border-radius: 12px;
            padding: 32px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
            max-width: 640px;
            margin: 0 auto;
        }
        h1 {
            margin: 0 0 16px 0;
            font-size: 24px;
            font-weight: 600;
        }
        .flash {
            border-radius: 8px;
            padding: 12px 16px;
            margin-bottom: 12px;
        }
        .flash.success { background: #D1FAE5; color: #065F46; }
        .flash.error { background: #FEE2E2; color: #991B1B; }
        label { display: block; margin: 16px 0 6px 0; font-weight: 600; }
        select, textarea, input[type=text] {
            width: 100%;
            box-sizing: border-box;
            padding: 8px;
            border: 1px solid #D1D5DB;
            border-radius: 6px;
            font-size: 14px;
        }
        textarea { min-height: 140px; font-family: inherit; }
        button, .link-button {
            margin-top: 16px;
            padding: 10px 18px;
            border: none;
            border-radius: 6px;
            background: #1D9BF0;
            color: white;
            font-size: 14px;
            cursor: pointer;
            text-decoration: none;
            display: inline-block;
        }
        .row { display: flex; gap: 8px; align-items: flex-end; }
        .row > div { flex: 1; }
        .muted { color: #6B7280; font-size: 14px; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Promo Poster</h1>
        {FLASHES}
        <a class="link-button" href="/login">Link an X account</a>

        <div class="row">
            <div>
                <label for="asin">ASIN</label>
                <input type="text" id="asin" placeholder="B00KALEHJE">
            </div>
            <button type="button" id="generate">Generate</button>
        </div>
        <p class="muted" id="generate-status"></p>

        <form method="post" action="/">
            <label for="account">Account</label>
            <select name="account" id="account">
                {ACCOUNTS}
            </select>

            <label for="text">Text</label>
            <textarea name="text" id="text"></textarea>

            <button type="submit">Post</button>
        </form>
    </div>
    <script>
        document.getElementById("generate").addEventListener("click", async () => {
            const status = document.getElementById("generate-status");
            status.textContent = "Generating...";
            try {
                const resp = await fetch("/generate_tweet", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({ asin: document.getElementById("asin").value }),
                });
                const data = await resp.json();
                if (data.ok) {
                    document.getElementById("text").value = data.post_text;
                    status.textContent = "";
                } else {
                    status.textContent = data.error;
                }
            } catch (e) {
                status.textContent = String(e);
            }
        });
    </script>
</body>
</html>"#;

const NO_ACCOUNTS_OPTION: &str = r#"<option value="" disabled selected>No linked accounts</option>"#;

pub fn index_page(accounts: &[AccountSummary], flashes: &[Flash]) -> String {
    let flashes = flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="flash {}">{}</div>"#,
                flash.level.as_str(),
                escape_html(&flash.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let accounts = if accounts.is_empty() {
        NO_ACCOUNTS_OPTION.to_string()
    } else {
        accounts
            .iter()
            .map(|account| {
                format!(
                    r#"<option value="{}">{}</option>"#,
                    escape_html(&account.account_id),
                    escape_html(&account.username)
                )
            })
            .collect::<Vec<_>>()
            .join("\n                ")
    };

    fill_template(
        INDEX_HTML_TEMPLATE,
        &[("{FLASHES}", flashes.as_str()), ("{ACCOUNTS}", accounts.as_str())],
    )
}

/// Substitute placeholders in one pass. Inserted values are never scanned
/// again, so user text that looks like a placeholder stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut page = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|&(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|&(at, _, _)| at);
        let Some((at, placeholder, value)) = next else {
            break;
        };

        page.push_str(&rest[..at]);
        page.push_str(value);
        rest = &rest[at + placeholder.len()..];
    }
    page.push_str(rest);

    page
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
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
