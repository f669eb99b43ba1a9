use axum::{
    http::header,
    response::{Html, IntoResponse},
};

pub async fn dashboard() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Html(DASHBOARD_HTML),
    )
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Live Election Results</title>
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
    <style>
        :root {
            --bg: #f8fafc;
            --surface: #ffffff;
            --border: #e2e8f0;
            --text: #1e293b;
            --muted: #64748b;
            --accent: #2563eb;
            --danger: #b91c1c;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: system-ui, -apple-system, sans-serif; background: var(--bg); color: var(--text); min-height: 100vh; }

        .layout { display: flex; min-height: 100vh; }

        aside {
            width: 300px;
            flex-shrink: 0;
            background: var(--surface);
            border-right: 1px solid var(--border);
            padding: 1.5rem;
            display: flex;
            flex-direction: column;
            gap: 1rem;
        }
        aside h2 { font-size: 1rem; font-weight: 600; }
        aside label { display: flex; flex-direction: column; gap: 0.35rem; font-size: 0.875rem; color: var(--muted); }
        aside input[type=text] {
            padding: 0.5rem;
            border: 1px solid var(--border);
            border-radius: 0.375rem;
            font-size: 0.875rem;
            color: var(--text);
        }
        aside .toggle { flex-direction: row; align-items: center; gap: 0.5rem; }
        aside .toggle input { width: 1rem; height: 1rem; accent-color: var(--accent); }
        .slider-value { font-weight: 600; color: var(--text); }

        button {
            padding: 0.5rem 1rem;
            border: 1px solid var(--accent);
            border-radius: 0.375rem;
            background: var(--surface);
            color: var(--accent);
            font-size: 0.875rem;
            cursor: pointer;
            transition: all 0.15s;
        }
        button:hover:not(:disabled) { background: var(--accent); color: white; }
        button:disabled { opacity: 0.5; cursor: not-allowed; }

        main { flex: 1; padding: 1.5rem 2rem; min-width: 0; }
        h1 { font-size: 1.5rem; font-weight: 600; margin-bottom: 1rem; }

        #chart {
            background: var(--surface);
            border: 1px solid var(--border);
            border-radius: 0.5rem;
            min-height: 500px;
        }
        .error {
            display: none;
            padding: 0.75rem 1rem;
            margin-bottom: 1rem;
            border: 1px solid #fecaca;
            border-radius: 0.5rem;
            background: #fef2f2;
            color: var(--danger);
            font-size: 0.875rem;
        }
        details {
            margin-top: 1rem;
            background: var(--surface);
            border: 1px solid var(--border);
            border-radius: 0.5rem;
            padding: 0.75rem 1rem;
        }
        summary { cursor: pointer; font-size: 0.875rem; font-weight: 600; }
        table { width: 100%; border-collapse: collapse; margin-top: 0.75rem; font-size: 0.875rem; }
        th, td { text-align: left; padding: 0.35rem 0.5rem; border-bottom: 1px solid var(--border); }
        th { color: var(--muted); font-weight: 600; }
        .caption { margin-top: 0.75rem; font-size: 0.75rem; color: var(--muted); }
    </style>
</head>
<body>
<div class="layout">
    <aside>
        <h2>Configuration</h2>
        <label>Google Sheet URL
            <input type="text" id="sheet-url">
        </label>
        <label>Worksheet Name
            <input type="text" id="worksheet-name">
        </label>
        <label>Refresh Rate (seconds): <span class="slider-value" id="interval-value"></span>
            <input type="range" id="refresh-interval" min="1" max="60" step="1">
        </label>
        <label class="toggle">
            <input type="checkbox" id="auto-refresh"> Auto-refresh
        </label>
        <button id="refresh-now">Refresh Now</button>
    </aside>
    <main>
        <h1>Live Election Results Dashboard</h1>
        <div class="error" id="error"></div>
        <div id="chart"></div>
        <details>
            <summary>View Raw Data</summary>
            <table id="raw-data"></table>
        </details>
        <p class="caption" id="caption"></p>
    </main>
</div>
<script>
const $ = id => document.getElementById(id);
const api = (url, opts) => fetch(url, opts).then(async r => {
    const body = await r.json();
    if (!r.ok) throw new Error(body.error || r.statusText);
    return body;
});

let lastRendered = null;
let editing = false;

function escapeHtml(s) {
    return String(s).replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
}

function showError(message) {
    const el = $('error');
    el.textContent = message ? `Error: ${message}` : '';
    el.style.display = message ? 'block' : 'none';
}

function renderChart(chart) {
    const trace = {
        type: 'bar',
        x: chart.bars.map(b => b.label),
        y: chart.bars.map(b => b.value),
        text: chart.bars.map(b => b.text),
        textposition: 'auto',
        marker: { color: chart.bars.map(b => b.color) },
    };
    const layout = {
        title: chart.title,
        xaxis: { title: chart.x_axis_title },
        yaxis: { title: chart.y_axis_title },
        showlegend: chart.show_legend,
        height: chart.height,
        plot_bgcolor: chart.background,
        font: { size: chart.font_size },
    };
    Plotly.react('chart', [trace], layout, { responsive: true });
}

function renderTable(columns, rows) {
    const head = '<tr>' + columns.map(c => `<th>${escapeHtml(c)}</th>`).join('') + '</tr>';
    const body = rows.map(r =>
        '<tr>' + columns.map(c => `<td>${escapeHtml(r[c] ?? '')}</td>`).join('') + '</tr>'
    ).join('');
    $('raw-data').innerHTML = head + body;
}

function renderView(view) {
    if (view.last_updated === lastRendered) return;
    lastRendered = view.last_updated;
    renderChart(view.chart);
    renderTable(view.columns, view.rows);
    $('caption').textContent = `Last updated: ${view.last_updated_display}`;
}

function fillSettings(settings, manualEnabled) {
    if (editing) return;
    $('sheet-url').value = settings.sheet_url;
    $('worksheet-name').value = settings.worksheet_name;
    $('refresh-interval').value = settings.refresh_interval_secs;
    $('interval-value').textContent = settings.refresh_interval_secs;
    $('auto-refresh').checked = settings.auto_refresh;
    $('refresh-now').disabled = !manualEnabled;
    $('auto-refresh').disabled = !manualEnabled;
    $('refresh-interval').disabled = !manualEnabled;
}

async function poll() {
    try {
        const state = await api('/api/dashboard');
        fillSettings(state.settings, state.manual_refresh_enabled);
        if (state.state.phase === 'failed' && state.error) {
            showError(state.error.message);
        } else {
            showError(null);
            if (state.view) renderView(state.view);
        }
    } catch (e) {
        showError(e.message);
    }
}

async function saveSettings() {
    editing = false;
    try {
        await api('/api/settings', {
            method: 'PUT',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({
                sheet_url: $('sheet-url').value,
                worksheet_name: $('worksheet-name').value,
                refresh_interval_secs: Number($('refresh-interval').value),
                auto_refresh: $('auto-refresh').checked,
            }),
        });
        poll();
    } catch (e) {
        showError(e.message);
    }
}

['sheet-url', 'worksheet-name'].forEach(id => {
    $(id).addEventListener('focus', () => { editing = true; });
    $(id).addEventListener('change', saveSettings);
});
$('refresh-interval').addEventListener('input', e => {
    editing = true;
    $('interval-value').textContent = e.target.value;
});
$('refresh-interval').addEventListener('change', saveSettings);
$('auto-refresh').addEventListener('change', saveSettings);
$('refresh-now').addEventListener('click', async () => {
    $('refresh-now').disabled = true;
    try {
        const view = await api('/api/refresh', { method: 'POST' });
        showError(null);
        renderView(view);
    } catch (e) {
        showError(e.message);
    } finally {
        $('refresh-now').disabled = false;
    }
});

poll();
setInterval(poll, 1000);
</script>
</body>
</html>
"##;
