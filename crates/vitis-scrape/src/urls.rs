//! VIVC URL construction and href handling.

use url::Url;

use crate::Result;

/// Rows requested per listing page; VIVC's maximum.
pub const LISTING_PER_PAGE: usize = 500;

/// Builds every VIVC URL the importers fetch, relative to one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VivcUrls {
  base: Url,
}

impl VivcUrls {
  pub fn new(base: &str) -> Result<Self> { Ok(Self { base: Url::parse(base)? }) }

  fn index(&self, pairs: &[(&str, &str)]) -> String {
    let mut url = self.base.clone();
    url.set_path("/index.php");
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.into()
  }

  /// One page of the per-country cultivar listing.
  pub fn listing(&self, iso_code: &str, page: usize) -> String {
    self.index(&[
      ("per-page", &LISTING_PER_PAGE.to_string()),
      ("page", &page.to_string()),
      ("SpeciesSearch[landescode22]", iso_code),
      ("r", "species/country"),
    ])
  }

  /// The country's listing entry point, stored as `Country::search_url`.
  pub fn country_search(&self, iso_code: &str) -> String {
    self.index(&[("r", "species/country"), ("SpeciesSearch[landescode22]", iso_code)])
  }

  /// Passport (detail) page of a cultivar.
  pub fn passport(&self, vivc_id: &str) -> String {
    self.index(&[("r", "passport/view"), ("id", vivc_id)])
  }

  /// Pedigree search listing cultivars that name `parent_name` as a parent.
  pub fn pedigree_search(&self, parent_name: &str) -> String {
    self.index(&[("r", "pedigree/index"), ("PedigreeSearch[text]", parent_name)])
  }

  /// Cultivar name search restricted to prime names.
  pub fn cultivar_search(&self, name: &str) -> String {
    self.index(&[
      ("r", "cultivarname/index"),
      ("CultivarnameSearch[cultivarnames]", ""),
      ("CultivarnameSearch[cultivarnames]", "leitname"),
      ("CultivarnameSearch[text]", name),
    ])
  }

  /// One page of the photo listing for a "part of plant" category, e.g.
  /// `"Cluster in the field"`.
  pub fn photo_listing(&self, part_of_plant: &str, page: usize) -> String {
    self.index(&[
      ("r", "fotoverweise/result"),
      ("FotoverweiseSearch[partplant]", part_of_plant),
      ("page", &page.to_string()),
    ])
  }

  /// Resolve an `href`/`src` found on a VIVC page to an absolute URL.
  ///
  /// Blank values, bare `#` and `javascript:` pseudo-links yield `None`.
  pub fn absolutize(&self, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == "#" || href.to_ascii_lowercase().starts_with("javascript:") {
      return None;
    }
    self.base.join(href).ok().map(String::from)
  }
}

/// Strip query string, fragment and trailing slashes; used to catch trivial
/// variants of the same photo URL.
pub fn normalize_url(url: &str) -> String {
  let end = url.find(['?', '#']).unwrap_or(url.len());
  url[..end].trim_end_matches('/').to_owned()
}

/// Extract the value after the last `id=` in an href, up to the next `&` or
/// `#`. `None` if there is no `id=` or the value is empty.
pub fn vivc_id_from_href(href: &str) -> Option<String> {
  let (_, tail) = href.rsplit_once("id=")?;
  let id = tail.split(['&', '#']).next()?.trim();
  (!id.is_empty()).then(|| id.to_owned())
}

/// Extract a numeric `kenn_nr=` query value, as used by photo listing rows.
pub fn kenn_nr_from_href(href: &str) -> Option<String> {
  let (_, tail) = href.split_once("kenn_nr=")?;
  let id = tail.split(['&', '#']).next()?;
  is_numeric(id).then(|| id.to_owned())
}

pub fn is_numeric(s: &str) -> bool { !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) }
