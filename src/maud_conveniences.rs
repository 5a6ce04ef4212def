use maud::{DOCTYPE, Markup, Render, html};

pub fn page(page_title: &str, markup: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8" {}
                meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                title { (page_title) }
            }
            body class="bg-gray-900 min-h-screen flex flex-col items-center text-white" {
                (render_nav())
                main class="w-full max-w-4xl p-4" {
                    (markup)
                }
            }
        }
    }
}

pub fn render_nav() -> Markup {
    html! {
        nav class="w-full bg-gray-800 shadow-md mb-8" {
            div class="max-w-4xl mx-auto px-4 py-3 flex flex-row space-x-6" {
                a href="/students" class="font-semibold hover:text-blue-300" {"Rollcall"}
                a href="/students" class="text-gray-300 hover:text-blue-300" {"All Students"}
                a href="/students/create" class="text-gray-300 hover:text-blue-300" {"Add Student"}
            }
        }
    }
}

pub fn render_table<const N: usize>(
    overall_title: &'static str,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="container mx-auto" {
            (title(overall_title))
            div class="overflow-x-auto" {
                table class="min-w-full bg-gray-800 rounded shadow-md" {
                    thead class="bg-gray-700" {
                        tr {
                            @for title in titles {
                                th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                            }
                        }
                    }
                    tbody {
                        @for row in items {
                            tr {
                                @for col in row {
                                    td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(col)}
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn supertitle(s: impl Render) -> Markup {
    html! {
        h1 class="text-3xl font-bold mb-6" {(s)}
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn form_element(id: &'static str, label: &'static str, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (input)
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    required: bool,
    ty: Option<&'static str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input required[required] type=(ty.unwrap_or("text")) id=(id) name=(id) value=[value] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
        },
    )
}

pub fn hidden_input(name: &'static str, value: impl Render) -> Markup {
    html! {
        input type="hidden" name=(name) value=(value);
    }
}

pub fn form_submit_button(text: Option<&'static str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

pub fn errors_list(heading: Option<&'static str>, errors: impl Iterator<Item = &'static str>) -> Markup {
    html! {
        div role="alert" class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" {
            strong class="font-bold" {(heading.unwrap_or("Please fix the following:"))}
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

pub fn detail_row(label: &'static str, value: impl Render) -> Markup {
    html! {
        div {
            p class="text-gray-300 text-sm" {(label)}
            p class="text-gray-100 text-lg" {(value)}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_form_element_keeps_submitted_value() {
        let rendered =
            simple_form_element("email", "Email", true, Some("email"), Some("a<b@example.com"))
                .into_string();
        assert!(rendered.contains(r#"type="email""#));
        assert!(rendered.contains("required"));
        assert!(rendered.contains(r#"value="a&lt;b@example.com""#));
    }

    #[test]
    fn table_renders_every_row() {
        let rendered = render_table(
            "People",
            ["Name", "Email"],
            vec![
                [html! {"Ada"}, html! {"ada@example.com"}],
                [html! {"Grace"}, html! {"grace@example.com"}],
            ],
        )
        .into_string();
        assert_eq!(rendered.matches("<tr>").count(), 3);
        assert!(rendered.contains("grace@example.com"));
    }
}
