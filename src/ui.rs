/// Renders the tracker page for one owner. All figures are fetched from the
/// JSON API by the page script.
pub fn render_index(owner: &str) -> String {
    INDEX_HTML
        .replace("{{OWNER_LABEL}}", &escape_html(owner))
        .replace("{{OWNER_JSON}}", &script_string(owner))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON string literal that is also safe inside a `<script>` element.
fn script_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>FarFit</title>
  <style>
    :root {
      --bg: #f3f6f4;
      --ink: #23302a;
      --muted: #6b7a72;
      --accent: #2f9e63;
      --warn: #d64545;
      --water: #1f7ae0;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(35, 48, 42, 0.12);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(880px, 100%);
      display: grid;
      gap: 22px;
    }

    section {
      background: var(--card);
      border-radius: 22px;
      box-shadow: var(--shadow);
      padding: 24px;
      display: grid;
      gap: 14px;
    }

    h1, h2 { margin: 0; }

    .subtitle { margin: 0; color: var(--muted); }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .stat {
      border: 1px solid rgba(35, 48, 42, 0.08);
      border-radius: 16px;
      padding: 14px;
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value { font-size: 1.5rem; font-weight: 600; }
    .over { color: var(--warn); }

    .bar {
      height: 10px;
      background: rgba(35, 48, 42, 0.08);
      border-radius: 999px;
      overflow: hidden;
    }

    .bar span { display: block; height: 100%; background: var(--accent); }
    .bar span.over { background: var(--warn); }

    form { display: grid; gap: 10px; }

    input, select, button {
      font: inherit;
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid #cfd8d3;
    }

    button {
      border: none;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    button.danger { background: var(--warn); }
    button.link { background: transparent; color: var(--warn); padding: 4px 8px; }

    ul.entries { list-style: none; margin: 0; padding: 0; display: grid; gap: 8px; }

    ul.entries li {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 10px;
      border-bottom: 1px solid rgba(35, 48, 42, 0.08);
      padding-bottom: 6px;
    }

    ul.entries img { width: 36px; height: 36px; object-fit: contain; }

    .cups { display: flex; gap: 8px; justify-content: center; }

    .cup {
      width: 30px;
      height: 48px;
      padding: 0;
      border: 2px solid var(--water);
      border-radius: 4px 4px 12px 12px;
      background: transparent;
    }

    .cup.full { background: var(--water); }

    .status { min-height: 1.2em; color: var(--muted); }
    .status[data-type="error"] { color: var(--warn); }
    .hidden { display: none; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>FarFit</h1>
      <p class="subtitle">Tracking for <strong>{{OWNER_LABEL}}</strong>. Entries stay until you reset the day.</p>
    </header>

    <section id="profile-section">
      <h2>Your goal</h2>
      <form id="profile-form">
        <input id="current-weight" type="number" step="0.1" min="1" placeholder="Current weight (kg)" required />
        <input id="target-weight" type="number" step="0.1" min="1" placeholder="Target weight (kg)" required />
        <select id="goal">
          <option value="lose">Lose weight</option>
          <option value="gain">Gain weight</option>
          <option value="maintain" selected>Maintain weight</option>
        </select>
        <button type="submit">Save</button>
      </form>
    </section>

    <div id="tracker" class="hidden">
      <section>
        <h2>Today</h2>
        <div class="grid">
          <div class="stat"><span class="label">Daily goal</span><span class="value" id="target">0</span></div>
          <div class="stat"><span class="label">Consumed</span><span class="value" id="consumed">0</span></div>
          <div class="stat"><span class="label">Burned</span><span class="value" id="burned">0</span></div>
          <div class="stat"><span class="label">Remaining</span><span class="value" id="remaining">0</span></div>
        </div>
        <div class="grid" id="meals"></div>
      </section>

      <section>
        <h2>Log food</h2>
        <form id="food-form">
          <input id="food-name" list="food-suggestions" placeholder="Type to search..." autocomplete="off" required />
          <datalist id="food-suggestions"></datalist>
          <div class="grid">
            <input id="food-amount" type="number" step="0.1" min="0.1" value="1" required />
            <select id="food-unit">
              <option value="gram">grams (g)</option>
              <option value="kilogram">kilograms (kg)</option>
              <option value="piece">pieces</option>
              <option value="tablespoon">tablespoons (tbsp)</option>
              <option value="teaspoon">teaspoons (tsp)</option>
              <option value="cup">cups</option>
              <option value="milliliter">milliliters (ml)</option>
              <option value="ounce">ounces (oz)</option>
            </select>
            <select id="food-meal">
              <option value="breakfast">Breakfast</option>
              <option value="lunch">Lunch</option>
              <option value="dinner">Dinner</option>
              <option value="snack">Snack</option>
            </select>
          </div>
          <button type="submit">Add</button>
        </form>
        <ul class="entries" id="foods"></ul>
      </section>

      <section>
        <h2>Log activity</h2>
        <form id="activity-form">
          <select id="activity-kind"></select>
          <input id="activity-duration" type="number" min="1" value="30" required />
          <button type="submit">Add activity</button>
        </form>
        <ul class="entries" id="activities"></ul>
      </section>

      <section>
        <h2>Did you drink water?</h2>
        <div class="cups" id="cups"></div>
        <p class="subtitle" id="cups-label">0 / 8 cups</p>
      </section>

      <button class="danger" id="reset" type="button">Reset day</button>
    </div>

    <div class="status" id="status"></div>
  </main>

  <script>
    const OWNER = {{OWNER_JSON}};
    const q = (extra = '') => `owner=${encodeURIComponent(OWNER)}${extra}`;
    const $ = (id) => document.getElementById(id);

    const setStatus = (message, type) => {
      $('status').textContent = message;
      $('status').dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const res = await fetch(path, {
        headers: { 'content-type': 'application/json' },
        ...options
      });
      const body = res.headers.get('content-type')?.includes('json') ? await res.json() : null;
      if (!res.ok) {
        const error = new Error((body && body.error) || `Request failed (${res.status})`);
        error.status = res.status;
        throw error;
      }
      return body;
    };

    const kcal = (value) => `${Math.round(value)} kcal`;

    const renderSummary = (summary) => {
      $('target').textContent = kcal(summary.target);
      $('consumed').textContent = kcal(summary.consumed);
      $('burned').textContent = kcal(summary.burned);
      $('remaining').textContent = kcal(summary.remaining);
      $('remaining').classList.toggle('over', summary.remaining < 0);

      $('meals').replaceChildren(...summary.meals.map((meal) => {
        const card = document.createElement('div');
        card.className = 'stat';
        const pct = meal.target > 0 ? Math.min(100, (meal.consumed / meal.target) * 100) : 0;
        const over = meal.remaining < 0;
        card.innerHTML = `
          <span class="label"></span>
          <span class="value"></span>
          <div class="bar"><span style="width:${pct}%" class="${over ? 'over' : ''}"></span></div>
          <span class="subtitle"></span>`;
        card.querySelector('.label').textContent = meal.meal_type;
        card.querySelector('.value').textContent = `${Math.round(meal.consumed)} / ${Math.round(meal.target)}`;
        card.querySelector('.subtitle').textContent =
          over ? `Excess ${Math.round(-meal.remaining)}` : `Remaining ${Math.round(meal.remaining)}`;
        return card;
      }));

      renderCups(summary.water_cups);
    };

    const entryRow = (text, image, onRemove) => {
      const li = document.createElement('li');
      if (image) {
        const img = document.createElement('img');
        img.src = image;
        img.alt = '';
        li.appendChild(img);
      }
      const span = document.createElement('span');
      span.textContent = text;
      const remove = document.createElement('button');
      remove.className = 'link';
      remove.type = 'button';
      remove.textContent = 'Remove';
      remove.addEventListener('click', () => onRemove().catch((err) => setStatus(err.message, 'error')));
      li.append(span, remove);
      return li;
    };

    const renderFoods = (foods) => {
      $('foods').replaceChildren(...foods.map((food) => entryRow(
        `${food.name} (${food.amount} ${food.unit}): ${Math.round(food.calories)} kcal`,
        food.image,
        async () => {
          await api(`/api/foods?${q(`&id=${encodeURIComponent(food.id)}`)}`, { method: 'DELETE' });
          await refresh();
        }
      )));
    };

    const renderActivities = (activities) => {
      $('activities').replaceChildren(...activities.map((activity) => entryRow(
        `${activity.name}, ${activity.duration_minutes} min: ${activity.calories_burned} kcal`,
        null,
        async () => {
          await api(`/api/activities?${q(`&id=${encodeURIComponent(activity.id)}`)}`, { method: 'DELETE' });
          await refresh();
        }
      )));
    };

    const renderCups = (cups) => {
      $('cups').replaceChildren(...Array.from({ length: 8 }, (_, index) => {
        const cup = document.createElement('button');
        cup.type = 'button';
        cup.className = `cup ${index < cups ? 'full' : ''}`;
        cup.addEventListener('click', async () => {
          try {
            const body = await api(`/api/water/tap?${q()}`, {
              method: 'POST',
              body: JSON.stringify({ index })
            });
            renderCups(body.cups);
          } catch (err) {
            setStatus(err.message, 'error');
          }
        });
        return cup;
      }));
      $('cups-label').textContent = `${cups} / 8 cups`;
    };

    const refresh = async () => {
      try {
        const summary = await api(`/api/summary?${q()}`);
        $('tracker').classList.remove('hidden');
        renderSummary(summary);
      } catch (err) {
        if (err.status === 409) {
          $('tracker').classList.add('hidden');
          return;
        }
        throw err;
      }
      const [foods, activities] = await Promise.all([
        api(`/api/foods?${q()}`),
        api(`/api/activities?${q()}`)
      ]);
      renderFoods(foods);
      renderActivities(activities);
    };

    const loadCatalogue = async () => {
      const catalogue = await api('/api/activities/catalogue');
      $('activity-kind').replaceChildren(...catalogue.map((entry) => {
        const option = document.createElement('option');
        option.value = entry.activity;
        option.textContent = entry.label;
        return option;
      }));
    };

    const loadProfile = async () => {
      try {
        const profile = await api(`/api/profile?${q()}`);
        $('current-weight').value = profile.current_weight_kg;
        $('target-weight').value = profile.target_weight_kg;
        $('goal').value = profile.goal;
      } catch (err) {
        if (err.status !== 409) throw err;
      }
    };

    $('profile-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const current = Number($('current-weight').value);
      const target = Number($('target-weight').value);
      if (!current || !target || current <= 0 || target <= 0) {
        setStatus('Please enter valid positive numbers.', 'error');
        return;
      }
      try {
        await api(`/api/profile?${q()}`, {
          method: 'PUT',
          body: JSON.stringify({ current_weight_kg: current, target_weight_kg: target, goal: $('goal').value })
        });
        setStatus('Saved', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    let suggestTimer = null;
    $('food-name').addEventListener('input', () => {
      clearTimeout(suggestTimer);
      const query = $('food-name').value.trim();
      if (query.length < 2) return;
      suggestTimer = setTimeout(async () => {
        try {
          const body = await api(`/api/foods/suggest?query=${encodeURIComponent(query)}`);
          $('food-suggestions').replaceChildren(...body.suggestions.map((name) => {
            const option = document.createElement('option');
            option.value = name;
            return option;
          }));
        } catch {
          $('food-suggestions').replaceChildren();
        }
      }, 300);
    });

    $('food-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const name = $('food-name').value.trim();
      const amount = parseFloat($('food-amount').value);
      if (!name) {
        setStatus('Please enter a valid food name.', 'error');
        return;
      }
      if (Number.isNaN(amount) || amount <= 0) {
        setStatus('Please enter a valid amount.', 'error');
        return;
      }
      setStatus('Looking up...', 'info');
      try {
        const meal = $('food-meal').value;
        await api(`/api/foods/lookup?${q()}`, {
          method: 'POST',
          body: JSON.stringify({ name, amount, unit: $('food-unit').value, category: meal, meal_type: meal })
        });
        $('food-name').value = '';
        $('food-amount').value = '1';
        setStatus('', '');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('activity-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      try {
        await api(`/api/activities?${q()}`, {
          method: 'POST',
          body: JSON.stringify({
            activity: $('activity-kind').value,
            duration_minutes: parseInt($('activity-duration').value, 10)
          })
        });
        $('activity-duration').value = '30';
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('reset').addEventListener('click', async () => {
      if (!window.confirm("Clear the day's data?")) return;
      try {
        await api(`/api/reset?${q()}`, { method: 'POST' });
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    Promise.all([loadCatalogue(), loadProfile()])
      .then(refresh)
      .catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_escaped_in_markup_and_script() {
        let html = render_index("</script><b>x</b>");
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("&lt;/script&gt;&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains(
            r#"const OWNER = "\u003c/script\u003e\u003cb\u003ex\u003c/b\u003e";"#
        ));
    }
}
