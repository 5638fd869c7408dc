//! Prompt construction for the classifier call.
//!
//! Every idea is prefixed with its provenance tag (`[#seq]`) so the
//! classifier can report exactly which submissions each node covers and no
//! merge loses authorship.

use crate::session::Idea;

pub fn build_prompt(topic: &str, ideas: &[Idea]) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are analysing the ideas collected in a brainstorming session.\n\n");
    prompt.push_str(&format!("Topic: \"{topic}\"\n\n"));
    prompt.push_str("Ideas, each prefixed with its provenance tag:\n");
    for idea in ideas {
        prompt.push_str(&format!(
            "- [#{}] \"{}\" (by {})\n",
            idea.seq, idea.text, idea.author
        ));
    }

    prompt.push_str(
        r#"
Build a mindmap of these ideas and return a JSON object with exactly this shape:
{
  "summary": "one or two sentences capturing the overall direction",
  "nodes": [
    {
      "id": "n1",
      "label": "category or idea",
      "note": "optional remark, e.g. a conflict between merged ideas",
      "ideas": [1, 2],
      "depends_on": ["n2"],
      "children": []
    }
  ]
}

Rules:
- Merge duplicate or near-duplicate ideas into a single node and list every merged idea's tag in "ideas"
- Every provenance tag must appear in exactly one node's "ideas" list
- Group related nodes under meaningful category nodes; use "children" for sub-grouping
- Give each node a unique "id" and use those ids in "depends_on" when one node builds on another
- Keep the original meaning of the ideas; do not invent new ideas
- If two ideas conflict, keep both and mention the conflict in "note"
- Return ONLY the JSON object, no markdown fences and no extra text
"#,
    );

    prompt
}
